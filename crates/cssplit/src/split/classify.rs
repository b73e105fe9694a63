//! How the partitioner treats each kind of node.

use cssplit_core::{AtRuleKind, Node, NodeId, SyntaxTree, TreeResult};

/// Partitioning role of an at-rule block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Never divided; moves as one unit of weight 1.
    Unbreakable,
    /// Holds declarations directly; never counted, travels with its neighbours.
    PropertyBag,
    /// A conditional or grouping block; walked into.
    Nested,
}

/// Classify an at-rule kind.
pub fn region(kind: AtRuleKind) -> Region {
    match kind {
        AtRuleKind::Keyframes => Region::Unbreakable,
        kind if kind.holds_declarations() => Region::PropertyBag,
        _ => Region::Nested,
    }
}

/// Whether a node is moved by extraction: a style rule, or a declaration
/// that sits directly in a block.
pub fn is_qualifying(tree: &SyntaxTree, id: NodeId) -> TreeResult<bool> {
    Ok(match tree.get(id)? {
        Node::Rule(_) => true,
        Node::Declaration(_) => match tree.parent(id)? {
            Some(parent) => matches!(tree.get(parent)?, Node::Block(_)),
            None => false,
        },
        _ => false,
    })
}

/// The style rules inside a block, in document order.
pub fn rules_within(tree: &SyntaxTree, id: NodeId) -> TreeResult<Vec<NodeId>> {
    let mut rules = Vec::new();
    for descendant in tree.descendants(id)? {
        if tree.get(descendant)?.as_rule().is_some() {
            rules.push(descendant);
        }
    }
    Ok(rules)
}

/// Selector count as seen by the partitioner: every rule outside unbreakable
/// regions counts its selectors, every non-empty unbreakable region counts 1.
pub fn weighted_selector_count(tree: &SyntaxTree) -> TreeResult<usize> {
    let mut count = 0;
    let mut stack: Vec<NodeId> = tree.children(tree.root())?.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        match tree.get(id)? {
            Node::Rule(rule) => count += rule.selector_count(),
            Node::Block(block) if region(block.kind) == Region::Unbreakable => {
                if !rules_within(tree, id)?.is_empty() {
                    count += 1;
                }
            }
            Node::Block(_) => stack.extend(tree.children(id)?.iter().rev().copied()),
            _ => {}
        }
    }

    Ok(count)
}
