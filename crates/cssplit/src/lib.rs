//! Split oversized stylesheets into selector-bounded files.
//!
//! Some consumers refuse stylesheets with more than a fixed number of
//! selectors. cssplit cuts a parsed stylesheet into fragments of at most
//! `max_selectors` selectors each, keeping every fragment's `@media` (and other
//! conditional) wrappers, and links the fragments back from the original with
//! `@import` so the cascade is unchanged.
//!
//! # Pieces
//!
//! - [`split`] - the partitioning engine (budget, rule splitting, extraction)
//! - [`ImportLinker`] - inserts `@import` directives into the remainder
//! - [`SplitOptions`] - configuration, loadable from TOML
//! - [`Splitter`] - runs everything and persists the fragments
//!
//! # Example
//!
//! ```no_run
//! use cssplit::{SourceFile, SplitOptions, Splitter};
//!
//! # async fn run() -> cssplit::Result<()> {
//! let options = SplitOptions {
//!     max_selectors: 4000,
//!     ..Default::default()
//! };
//! let splitter = Splitter::new(options)?;
//! let source = SourceFile::read("dist/app.css")?;
//! let output = splitter
//!     .process_source(&source, Some("dist/app.css".as_ref()))
//!     .await?;
//! println!("{} fragments", output.fragments.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod link;
mod naming;
mod options;
mod output;
mod processor;
pub mod split;

pub use error::{ConfigError, Error, Message, Result, Skipped, Warning};
pub use link::{ImportLinker, LinkReport, PreamblePolicy};
pub use naming::FileNameTemplate;
pub use options::{DEFAULT_FILE_NAME_TEMPLATE, DEFAULT_MAX_SELECTORS, SplitOptions};
pub use output::{Artifact, FsStorage, MemoryStorage, StorageWriter, map_path, persist_all};
pub use processor::{Fragment, SourceFile, SplitOutput, Splitter};

pub use cssplit_core::SyntaxTree;
pub use cssplit_syntax::{OutputStyle, Stringifier, parse_stylesheet};
