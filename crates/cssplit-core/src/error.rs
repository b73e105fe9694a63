//! Error types for syntax tree operations.

use std::fmt;

/// Errors that can occur while inspecting or mutating a [`SyntaxTree`](crate::SyntaxTree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The node ID is invalid or the node has been removed from this tree.
    InvalidNodeId,
    /// The operation needs a node that can hold children (the root or a block).
    NotAContainer,
    /// The root node cannot be detached, removed or moved.
    RootNode,
    /// The node already has a parent; detach it first.
    AlreadyAttached,
    /// Attaching the node would make it its own ancestor.
    CircularParentage,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNodeId => write!(f, "Invalid or removed node ID"),
            Self::NotAContainer => write!(f, "Node cannot hold children"),
            Self::RootNode => write!(f, "Operation is not allowed on the root node"),
            Self::AlreadyAttached => write!(f, "Node is already attached to a parent"),
            Self::CircularParentage => {
                write!(f, "Cannot attach a node below itself")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Result type for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;
