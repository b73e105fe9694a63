//! Splitting one style rule in two.

use cssplit_core::{Node, NodeId, StyleRule, SyntaxTree, TreeResult};

/// Split the rule `id` at selector `index`.
///
/// The rule keeps `selectors[..index]`; a new sibling inserted right after it
/// gets `selectors[index..]` and its own copy of the declarations. Returns the
/// sibling, or `None` when there is nothing to split (`index` is 0, `index` is
/// not below the selector count, or `id` is not a rule).
pub fn split_rule(tree: &mut SyntaxTree, id: NodeId, index: usize) -> TreeResult<Option<NodeId>> {
    let Some(rule) = tree.rule_mut(id)? else {
        return Ok(None);
    };
    if index == 0 || index >= rule.selectors.len() {
        return Ok(None);
    }

    let tail = StyleRule {
        selectors: rule.selectors.split_off(index),
        declarations: rule.declarations.clone(),
    };

    let source = tree.source(id)?;
    let sibling = tree.create(Node::Rule(tail));
    tree.set_source(sibling, source)?;
    tree.insert_after(id, sibling)?;
    Ok(Some(sibling))
}
