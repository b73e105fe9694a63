//! Logging and debugging facilities.
//!
//! cssplit uses the `tracing` crate for instrumentation. Library code only
//! emits events; install a subscriber in your application to see them:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! Use [`DisplayTree`] to render a [`SyntaxTree`] as an indented outline, which is
//! handy in trace logs and failing test output.

use std::fmt::{self, Write as FmtWrite};

use crate::error::TreeResult;
use crate::node::NodeId;
use crate::tree::SyntaxTree;

/// Target names for log filtering.
///
/// Use these with `tracing` directives (`RUST_LOG=cssplit::split=debug`) to
/// filter logs by subsystem.
pub mod targets {
    /// Tree mutation target.
    pub const TREE: &str = "cssplit_core::tree";
    /// Parser target.
    pub const PARSE: &str = "cssplit::parse";
    /// Partitioning target.
    pub const SPLIT: &str = "cssplit::split";
    /// Import linking target.
    pub const LINK: &str = "cssplit::link";
    /// Fragment persistence target.
    pub const OUTPUT: &str = "cssplit::output";
}

/// Render a syntax tree as an indented outline, one node per line, with the
/// source position of every parsed node.
pub fn format_tree(tree: &SyntaxTree) -> TreeResult<String> {
    let mut output = String::new();
    format_subtree_into(tree, tree.root(), 0, true, &mut output)?;
    Ok(output)
}

fn format_subtree_into(
    tree: &SyntaxTree,
    id: NodeId,
    depth: usize,
    is_last: bool,
    output: &mut String,
) -> TreeResult<()> {
    output.push_str(&build_prefix(depth, is_last));
    output.push_str(&tree.get(id)?.label());
    if let Some(position) = tree.source(id)? {
        write!(output, " ({position})").expect("write to String");
    }
    output.push('\n');

    let children = tree.children(id)?;
    let child_count = children.len();
    for (i, &child_id) in children.iter().enumerate() {
        format_subtree_into(tree, child_id, depth + 1, i + 1 == child_count, output)?;
    }

    Ok(())
}

fn build_prefix(depth: usize, is_last: bool) -> String {
    if depth == 0 {
        return String::new();
    }

    let mut prefix = String::new();
    for _ in 0..(depth - 1) {
        prefix.push_str("\u{2502}   ");
    }
    prefix.push_str(if is_last {
        "\u{2514}\u{2500}\u{2500} "
    } else {
        "\u{251c}\u{2500}\u{2500} "
    });
    prefix
}

/// Displays a tree as the outline produced by [`format_tree`].
pub struct DisplayTree<'a>(pub &'a SyntaxTree);

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match format_tree(self.0) {
            Ok(output) => write!(f, "{output}"),
            Err(e) => write!(f, "Error formatting syntax tree: {e}"),
        }
    }
}
