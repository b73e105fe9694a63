//! Moving a document-order range of a tree into a new fragment tree.

use std::collections::HashMap;

use cssplit_core::logging::targets;
use cssplit_core::{NodeId, SyntaxTree};

use super::classify::is_qualifying;
use crate::error::{Error, Result};

/// Extract every qualifying node from `start` through `end` (inclusive, in
/// document order) into a new tree.
///
/// Ancestors of extracted nodes are cloned without their children, once per
/// original ancestor, so the fragment keeps the same nesting. Qualifying nodes
/// themselves are moved. Ancestors left empty in `tree` are removed up to the
/// root.
///
/// # Errors
///
/// [`Error::Contract`] when `start` or `end` is not in `tree`, or `end`
/// precedes `start`.
pub fn extract(tree: &mut SyntaxTree, start: NodeId, end: NodeId) -> Result<SyntaxTree> {
    let order = tree.document_order();
    let position = |id: NodeId| order.iter().position(|&node| node == id);
    let (Some(first), Some(last)) = (position(start), position(end)) else {
        return Err(Error::contract("extraction range is not part of the tree"));
    };
    if first > last {
        return Err(Error::contract("extraction range ends before it starts"));
    }

    let mut qualifying = Vec::new();
    for &id in &order[first..=last] {
        if is_qualifying(tree, id)? {
            qualifying.push(id);
        }
    }

    let mut fragment = SyntaxTree::new();
    let mut clones: HashMap<NodeId, NodeId> = HashMap::new();
    clones.insert(tree.root(), fragment.root());
    let mut touched: Vec<NodeId> = Vec::new();

    for id in qualifying {
        let ancestors = tree.ancestors(id)?;
        for &ancestor in ancestors.iter().rev() {
            if clones.contains_key(&ancestor) {
                continue;
            }
            let parent = tree
                .parent(ancestor)?
                .and_then(|parent| clones.get(&parent).copied())
                .ok_or_else(|| Error::contract("ancestor chain does not reach the root"))?;
            let clone = fragment.append_at(
                parent,
                tree.clone_shallow(ancestor)?,
                tree.source(ancestor)?,
            )?;
            clones.insert(ancestor, clone);
        }

        let parent = ancestors
            .first()
            .copied()
            .ok_or_else(|| Error::contract("qualifying node is detached"))?;
        let dest_parent = clones
            .get(&parent)
            .copied()
            .ok_or_else(|| Error::contract("parent was not mirrored"))?;
        tree.move_to(id, &mut fragment, dest_parent)?;

        if touched.last() != Some(&parent) {
            touched.push(parent);
        }
    }

    prune_emptied(tree, touched)?;

    tracing::trace!(
        target: targets::SPLIT,
        nodes = fragment.node_count(),
        remaining = tree.node_count(),
        "extracted fragment"
    );
    Ok(fragment)
}

/// Remove containers that extraction left without children, walking up to
/// (not including) the root.
fn prune_emptied(tree: &mut SyntaxTree, touched: Vec<NodeId>) -> Result<()> {
    let root = tree.root();
    for id in touched.into_iter().rev() {
        let mut current = id;
        while current != root && tree.contains(current) && tree.children(current)?.is_empty() {
            let parent = tree.parent(current)?;
            tree.remove(current)?;
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }
    Ok(())
}
