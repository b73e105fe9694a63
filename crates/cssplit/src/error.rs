//! Error, warning and message types for splitting.

use std::fmt;
use std::io;
use std::path::PathBuf;

use cssplit_core::{SourcePosition, TreeError};

/// Result type alias for split operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid configuration. Checked once, before any tree is walked.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `max_selectors` must be at least 1.
    #[error("max_selectors must be a positive integer, got {0}")]
    InvalidMaxSelectors(usize),

    /// The file name template cannot produce distinct fragment names.
    #[error("Invalid file name template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// `file_name_start_index` plus a fragment index does not fit in `usize`.
    #[error("file_name_start_index {0} leaves no room to number the fragments")]
    StartIndexOverflow(usize),

    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`SplitOptions`](crate::SplitOptions).
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Create a template error.
    pub fn template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that stop a split run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A style rule without selectors reached the partitioner.
    #[error("Style rule{} has no selectors", at(.position))]
    EmptySelectorList { position: Option<SourcePosition> },

    /// An internal invariant of the split algorithm was broken.
    #[error("Split contract violated: {message}")]
    Contract {
        message: String,
        #[source]
        source: Option<TreeError>,
    },

    /// Writing a fragment or its source map failed. Nothing of the run is left on disk.
    #[error("Failed to write '{path}': {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Parsing or stringifying failed.
    #[error(transparent)]
    Syntax(#[from] cssplit_syntax::Error),

    /// I/O error outside of fragment persistence.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a contract violation without an underlying tree error.
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract {
            message: message.into(),
            source: None,
        }
    }
}

impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Self::Contract {
            message: "syntax tree operation failed".to_string(),
            source: Some(err),
        }
    }
}

fn at(position: &Option<SourcePosition>) -> String {
    position
        .map(|position| format!(" at {position}"))
        .unwrap_or_default()
}

/// What was skipped because no destination was configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skipped {
    /// Fragment files (and their source maps).
    Fragments,
    /// `@import` directives in the remainder.
    Imports,
}

/// Non-fatal problems reported alongside a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Fragments were produced but have nowhere to go.
    DestinationMissing { skipped: Skipped },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DestinationMissing {
                skipped: Skipped::Fragments,
            } => write!(
                f,
                "Destination is not provided, split CSS files will not be written"
            ),
            Warning::DestinationMissing {
                skipped: Skipped::Imports,
            } => write!(
                f,
                "Destination is not provided, @import directives will not be written"
            ),
        }
    }
}

/// Informational summary of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The stylesheet was split.
    Divided {
        fragments: usize,
        source: String,
        selectors: usize,
    },
    /// The stylesheet fits the budget and was left alone.
    Skipped { selectors: usize, source: String },
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Divided {
                fragments,
                source,
                selectors,
            } => write!(
                f,
                "Divided into {fragments} style files from {source} (Found {selectors} selectors)"
            ),
            Message::Skipped { selectors, source } => {
                write!(f, "Found {selectors} selectors, skipping {source}")
            }
        }
    }
}
