//! CSS text boundary for cssplit.
//!
//! This crate turns stylesheet text into a [`SyntaxTree`](cssplit_core::SyntaxTree)
//! and back:
//!
//! - **Parsing**: [`parse_stylesheet`] and [`parse_file`], built on `cssparser`,
//!   with per-rule error recovery
//! - **Stringifying**: [`Stringifier`] in [`OutputStyle::Pretty`] or
//!   [`OutputStyle::Compact`]
//! - **Source maps**: [`Stringifier::stringify_with_map`] maps every parsed node
//!   back to its original position
//!
//! # Example
//!
//! ```
//! use cssplit_syntax::{OutputStyle, Stringifier, parse_stylesheet};
//!
//! let tree = parse_stylesheet("a,b{color:red}").unwrap();
//! let css = Stringifier::new(OutputStyle::Pretty).stringify(&tree).unwrap();
//! assert_eq!(css, "a, b {\n  color: red;\n}\n");
//! ```

mod error;
mod parser;
mod stringify;

pub use error::{Error, Result};
pub use parser::{parse_file, parse_stylesheet};
pub use stringify::{MapOptions, OutputStyle, Stringified, Stringifier};
