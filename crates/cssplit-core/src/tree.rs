//! Arena-backed stylesheet syntax tree.
//!
//! Every [`SyntaxTree`] owns its nodes in a `SlotMap`. A node belongs to exactly
//! one tree at a time: [`SyntaxTree::move_to`] detaches a subtree and transfers
//! ownership into another tree, and [`SyntaxTree::clone_shallow`] is the only way
//! to duplicate a node's payload.
//!
//! # Example
//!
//! ```
//! use cssplit_core::{AtBlock, Node, StyleRule, SyntaxTree};
//!
//! let mut tree = SyntaxTree::new();
//! let media = tree.append(tree.root(), Node::Block(AtBlock::new("media", "print"))).unwrap();
//! tree.append(media, Node::Rule(StyleRule::new(["a", "b"]))).unwrap();
//!
//! assert_eq!(tree.selector_count(), 2);
//! ```

use slotmap::SlotMap;

use crate::error::{TreeError, TreeResult};
use crate::logging::targets;
use crate::node::{Node, NodeId, SourcePosition, StyleRule};

/// Internal data stored in the arena for each node.
#[derive(Debug, Clone)]
struct NodeData {
    /// The node payload.
    node: Node,
    /// Parent node (`None` for the root and for detached nodes).
    parent: Option<NodeId>,
    /// Child nodes in document order.
    children: Vec<NodeId>,
    /// Where the node came from, if it was parsed.
    source: Option<SourcePosition>,
}

impl NodeData {
    fn new(node: Node, source: Option<SourcePosition>) -> Self {
        Self {
            node,
            parent: None,
            children: Vec::new(),
            source,
        }
    }
}

/// An ordered, rooted tree of stylesheet nodes.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    /// Create a tree holding only a root node.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new(Node::Root, None));
        Self { nodes, root }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, including the root and detached nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[self.root].children.is_empty()
    }

    /// Check if a node exists in this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get a node's payload.
    pub fn get(&self, id: NodeId) -> TreeResult<&Node> {
        self.nodes
            .get(id)
            .map(|d| &d.node)
            .ok_or(TreeError::InvalidNodeId)
    }

    /// Get a node's payload mutably.
    pub fn get_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .map(|d| &mut d.node)
            .ok_or(TreeError::InvalidNodeId)
    }

    /// Get a style rule, or `None` if the node is not a rule.
    pub fn rule(&self, id: NodeId) -> TreeResult<Option<&StyleRule>> {
        Ok(self.get(id)?.as_rule())
    }

    /// Get a style rule mutably, or `None` if the node is not a rule.
    pub fn rule_mut(&mut self, id: NodeId) -> TreeResult<Option<&mut StyleRule>> {
        match self.get_mut(id)? {
            Node::Rule(rule) => Ok(Some(rule)),
            _ => Ok(None),
        }
    }

    /// Get the source position recorded for a node.
    pub fn source(&self, id: NodeId) -> TreeResult<Option<SourcePosition>> {
        self.nodes
            .get(id)
            .map(|d| d.source)
            .ok_or(TreeError::InvalidNodeId)
    }

    /// Record the source position of a node.
    pub fn set_source(&mut self, id: NodeId, source: Option<SourcePosition>) -> TreeResult<()> {
        let data = self.nodes.get_mut(id).ok_or(TreeError::InvalidNodeId)?;
        data.source = source;
        Ok(())
    }

    /// Get the parent of a node.
    pub fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        self.nodes
            .get(id)
            .map(|d| d.parent)
            .ok_or(TreeError::InvalidNodeId)
    }

    /// Get the children of a node.
    pub fn children(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        self.nodes
            .get(id)
            .map(|d| d.children.as_slice())
            .ok_or(TreeError::InvalidNodeId)
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a detached node. Attach it with [`append_child`](Self::append_child)
    /// or one of the insert methods.
    pub fn create(&mut self, node: Node) -> NodeId {
        self.nodes.insert(NodeData::new(node, None))
    }

    /// Create a node and append it as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, node: Node) -> TreeResult<NodeId> {
        self.ensure_container(parent)?;
        let id = self.create(node);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Create a node with a source position and append it to `parent`.
    pub fn append_at(
        &mut self,
        parent: NodeId,
        node: Node,
        source: Option<SourcePosition>,
    ) -> TreeResult<NodeId> {
        let id = self.append(parent, node)?;
        self.set_source(id, source)?;
        Ok(id)
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let index = self.children(parent)?.len();
        self.insert_child(parent, index, child)
    }

    /// Attach a detached node as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.insert_child(parent, 0, child)
    }

    /// Attach a detached node directly after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, child: NodeId) -> TreeResult<()> {
        let parent = self.parent(sibling)?.ok_or(TreeError::RootNode)?;
        let index = self
            .sibling_index(sibling)?
            .ok_or(TreeError::InvalidNodeId)?;
        self.insert_child(parent, index + 1, child)
    }

    /// Attach a detached node at `index` among the children of `parent`.
    ///
    /// The index is clamped to the number of children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> TreeResult<()> {
        self.ensure_container(parent)?;
        if child == self.root {
            return Err(TreeError::RootNode);
        }
        let child_data = self.nodes.get(child).ok_or(TreeError::InvalidNodeId)?;
        if child_data.parent.is_some() {
            return Err(TreeError::AlreadyAttached);
        }
        if self.is_ancestor_of(child, parent) {
            return Err(TreeError::CircularParentage);
        }

        self.nodes[child].parent = Some(parent);
        let siblings = &mut self.nodes[parent].children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        Ok(())
    }

    // =========================================================================
    // Removal and ownership transfer
    // =========================================================================

    /// Detach a node from its parent. The node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) -> TreeResult<()> {
        if id == self.root {
            return Err(TreeError::RootNode);
        }
        let parent = self.parent(id)?;
        if let Some(parent_id) = parent {
            if let Some(parent_data) = self.nodes.get_mut(parent_id) {
                parent_data.children.retain(|&child| child != id);
            }
            self.nodes[id].parent = None;
            tracing::trace!(target: targets::TREE, ?id, ?parent_id, "detached node");
        }
        Ok(())
    }

    /// Detach a node and drop it together with its subtree.
    pub fn remove(&mut self, id: NodeId) -> TreeResult<()> {
        self.detach(id)?;
        let descendants = self.descendants(id)?;
        for descendant in descendants {
            self.nodes.remove(descendant);
        }
        self.nodes.remove(id);
        Ok(())
    }

    /// Move a node and its subtree into `dest`, appending it to `dest_parent`.
    ///
    /// The node is detached from its current parent first, then every node of
    /// the subtree is transferred into `dest`'s arena. Returns the node's ID in
    /// `dest`; the old ID is invalid afterwards.
    pub fn move_to(
        &mut self,
        id: NodeId,
        dest: &mut SyntaxTree,
        dest_parent: NodeId,
    ) -> TreeResult<NodeId> {
        if id == self.root {
            return Err(TreeError::RootNode);
        }
        dest.ensure_container(dest_parent)?;
        self.detach(id)?;
        let new_id = self.transfer(id, dest, dest_parent)?;
        tracing::trace!(target: targets::TREE, ?id, ?new_id, "moved node into another tree");
        Ok(new_id)
    }

    fn transfer(
        &mut self,
        id: NodeId,
        dest: &mut SyntaxTree,
        dest_parent: NodeId,
    ) -> TreeResult<NodeId> {
        let data = self.nodes.remove(id).ok_or(TreeError::InvalidNodeId)?;
        let new_id = dest.nodes.insert(NodeData {
            node: data.node,
            parent: Some(dest_parent),
            children: Vec::with_capacity(data.children.len()),
            source: data.source,
        });
        dest.nodes[dest_parent].children.push(new_id);

        for child in data.children {
            self.transfer(child, dest, new_id)?;
        }
        Ok(new_id)
    }

    /// Copy a node's payload without its children.
    pub fn clone_shallow(&self, id: NodeId) -> TreeResult<Node> {
        self.get(id).cloned()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Index of a node among its parent's children (`None` for detached nodes).
    pub fn sibling_index(&self, id: NodeId) -> TreeResult<Option<usize>> {
        let data = self.nodes.get(id).ok_or(TreeError::InvalidNodeId)?;
        match data.parent {
            Some(parent_id) => {
                let parent_data = self.nodes.get(parent_id).ok_or(TreeError::InvalidNodeId)?;
                Ok(parent_data.children.iter().position(|&child| child == id))
            }
            None => Ok(None),
        }
    }

    /// All ancestors of a node from its immediate parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = self.parent(id)?;

        while let Some(current_id) = current {
            result.push(current_id);
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }

        Ok(result)
    }

    /// All descendants of a node in document (depth-first pre-) order, excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let data = self.nodes.get(id).ok_or(TreeError::InvalidNodeId)?;
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = data.children.iter().rev().copied().collect();

        while let Some(next) = stack.pop() {
            result.push(next);
            if let Some(next_data) = self.nodes.get(next) {
                stack.extend(next_data.children.iter().rev().copied());
            }
        }

        Ok(result)
    }

    /// Every attached node below the root in document order.
    pub fn document_order(&self) -> Vec<NodeId> {
        self.descendants(self.root).unwrap_or_default()
    }

    /// Style rules in document order.
    pub fn rules(&self) -> Vec<(NodeId, &StyleRule)> {
        self.document_order()
            .into_iter()
            .filter_map(|id| self.nodes.get(id).and_then(|d| d.node.as_rule()).map(|r| (id, r)))
            .collect()
    }

    /// Total number of selectors over every rule in the tree.
    pub fn selector_count(&self) -> usize {
        self.rules().iter().map(|(_, rule)| rule.selector_count()).sum()
    }

    fn is_ancestor_of(&self, potential_ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }
        false
    }

    fn ensure_container(&self, id: NodeId) -> TreeResult<()> {
        if self.get(id)?.is_container() {
            Ok(())
        } else {
            Err(TreeError::NotAContainer)
        }
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AtBlock, Declaration};

    fn rule(selectors: &[&str]) -> Node {
        Node::Rule(StyleRule::new(selectors.iter().copied()))
    }

    #[test]
    fn append_and_navigate() {
        let mut tree = SyntaxTree::new();
        let a = tree.append(tree.root(), rule(&["a"])).unwrap();
        let media = tree
            .append(tree.root(), Node::Block(AtBlock::new("media", "print")))
            .unwrap();
        let b = tree.append(media, rule(&["b", "c"])).unwrap();

        assert_eq!(tree.children(tree.root()).unwrap(), &[a, media]);
        assert_eq!(tree.parent(b).unwrap(), Some(media));
        assert_eq!(tree.ancestors(b).unwrap(), vec![media, tree.root()]);
        assert_eq!(tree.sibling_index(media).unwrap(), Some(1));
        assert_eq!(tree.document_order(), vec![a, media, b]);
        assert_eq!(tree.selector_count(), 3);
    }

    #[test]
    fn rules_cannot_hold_children() {
        let mut tree = SyntaxTree::new();
        let a = tree.append(tree.root(), rule(&["a"])).unwrap();
        let result = tree.append(a, Node::Declaration(Declaration::new("color", "red")));
        assert_eq!(result, Err(TreeError::NotAContainer));
    }

    #[test]
    fn attach_requires_detached_node() {
        let mut tree = SyntaxTree::new();
        let a = tree.append(tree.root(), rule(&["a"])).unwrap();
        assert_eq!(tree.append_child(tree.root(), a), Err(TreeError::AlreadyAttached));

        tree.detach(a).unwrap();
        assert!(tree.is_empty());
        tree.prepend_child(tree.root(), a).unwrap();
        assert_eq!(tree.children(tree.root()).unwrap(), &[a]);
    }

    #[test]
    fn circular_parentage_rejected() {
        let mut tree = SyntaxTree::new();
        let outer = tree
            .append(tree.root(), Node::Block(AtBlock::new("media", "screen")))
            .unwrap();
        let inner = tree
            .append(outer, Node::Block(AtBlock::new("supports", "(display: grid)")))
            .unwrap();

        tree.detach(outer).unwrap();
        assert_eq!(
            tree.append_child(inner, outer),
            Err(TreeError::CircularParentage)
        );
    }

    #[test]
    fn insert_after_keeps_order() {
        let mut tree = SyntaxTree::new();
        let a = tree.append(tree.root(), rule(&["a"])).unwrap();
        let c = tree.append(tree.root(), rule(&["c"])).unwrap();
        let b = tree.create(rule(&["b"]));
        tree.insert_after(a, b).unwrap();

        assert_eq!(tree.children(tree.root()).unwrap(), &[a, b, c]);
    }

    #[test]
    fn remove_drops_subtree() {
        let mut tree = SyntaxTree::new();
        let media = tree
            .append(tree.root(), Node::Block(AtBlock::new("media", "print")))
            .unwrap();
        let a = tree.append(media, rule(&["a"])).unwrap();

        tree.remove(media).unwrap();
        assert!(!tree.contains(media));
        assert!(!tree.contains(a));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.remove(tree.root()), Err(TreeError::RootNode));
    }

    #[test]
    fn move_transfers_ownership() {
        let mut source = SyntaxTree::new();
        let media = source
            .append(source.root(), Node::Block(AtBlock::new("media", "print")))
            .unwrap();
        let a = source.append(media, rule(&["a"])).unwrap();
        source.set_source(a, Some(SourcePosition::new(2, 5))).unwrap();

        let mut dest = SyntaxTree::new();
        let dest_root = dest.root();
        let moved = source.move_to(media, &mut dest, dest_root).unwrap();

        assert!(source.is_empty());
        assert!(!source.contains(a));
        assert_eq!(source.node_count(), 1);

        let moved_children = dest.children(moved).unwrap();
        assert_eq!(moved_children.len(), 1);
        let moved_rule = moved_children[0];
        assert_eq!(dest.parent(moved_rule).unwrap(), Some(moved));
        assert_eq!(
            dest.source(moved_rule).unwrap(),
            Some(SourcePosition::new(2, 5))
        );
        assert_eq!(dest.selector_count(), 1);
    }

    #[test]
    fn clone_shallow_copies_payload_only() {
        let mut tree = SyntaxTree::new();
        let media = tree
            .append(tree.root(), Node::Block(AtBlock::new("media", "print")))
            .unwrap();
        tree.append(media, rule(&["a"])).unwrap();

        let copy = tree.clone_shallow(media).unwrap();
        let mut other = SyntaxTree::new();
        let copy_id = other.append(other.root(), copy).unwrap();

        assert!(other.children(copy_id).unwrap().is_empty());
        assert_eq!(other.get(copy_id).unwrap().as_block().unwrap().prelude, "print");
    }
}
