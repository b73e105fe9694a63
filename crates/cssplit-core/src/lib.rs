//! Stylesheet syntax tree for cssplit.
//!
//! This crate provides the tree the splitter works on:
//!
//! - **Arena storage**: nodes live in a `SlotMap` owned by one [`SyntaxTree`]
//! - **Single ownership**: every node has at most one parent; [`SyntaxTree::move_to`]
//!   detaches a subtree and transfers it into another tree
//! - **Document order**: child order fully determines serialized order
//! - **At-rule classification**: the closed [`AtRuleKind`] set
//!
//! # Example
//!
//! ```
//! use cssplit_core::{Declaration, Node, StyleRule, SyntaxTree};
//!
//! let mut tree = SyntaxTree::new();
//! let rule = StyleRule::new(["h1", "h2"]).with_declaration(Declaration::new("margin", "0"));
//! tree.append(tree.root(), Node::Rule(rule)).unwrap();
//!
//! assert_eq!(tree.selector_count(), 2);
//! ```

pub mod logging;
mod error;
mod node;
mod tree;

pub use error::{TreeError, TreeResult};
pub use node::{
    AtBlock, AtRuleKind, Declaration, Directive, Node, NodeId, SourcePosition, StyleRule,
};
pub use tree::SyntaxTree;
