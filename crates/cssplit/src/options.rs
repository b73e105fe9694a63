//! Split configuration.
//!
//! [`SplitOptions`] is plain data: every field has a default and the whole
//! struct can be loaded from TOML.
//!
//! ```toml
//! max_selectors = 4000
//! file_name_template = "%original%-%i%"
//! file_name_start_index = 0
//! write_fragments = true
//! write_source_maps = true
//! emit_import_links = true
//! quiet = false
//! preamble = "hoist"
//! output_style = "pretty"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use cssplit_syntax::OutputStyle;

use crate::error::ConfigError;
use crate::link::PreamblePolicy;
use crate::naming::FileNameTemplate;

/// Default selector budget per file.
pub const DEFAULT_MAX_SELECTORS: usize = 4000;

/// Default fragment file name template.
pub const DEFAULT_FILE_NAME_TEMPLATE: &str = "%original%-%i%";

/// Options for a split run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Maximum number of selectors per output file.
    pub max_selectors: usize,
    /// Fragment file stem pattern, see [`FileNameTemplate`].
    pub file_name_template: String,
    /// Added to the fragment index before it is substituted for `%i%`.
    pub file_name_start_index: usize,
    /// Persist fragments next to the destination.
    pub write_fragments: bool,
    /// Write a `.map` file for every fragment when the input is known.
    pub write_source_maps: bool,
    /// Link fragments from the remainder with `@import`.
    pub emit_import_links: bool,
    /// Suppress the informational summary log.
    pub quiet: bool,
    /// How `@charset` directives in the remainder are treated.
    pub preamble: PreamblePolicy,
    /// Formatting of generated CSS.
    pub output_style: OutputStyle,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            max_selectors: DEFAULT_MAX_SELECTORS,
            file_name_template: DEFAULT_FILE_NAME_TEMPLATE.to_string(),
            file_name_start_index: 0,
            write_fragments: true,
            write_source_maps: true,
            emit_import_links: true,
            quiet: false,
            preamble: PreamblePolicy::default(),
            output_style: OutputStyle::default(),
        }
    }
}

impl SplitOptions {
    /// Parse options from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check the options and return the parsed file name template.
    pub fn validate(&self) -> Result<FileNameTemplate, ConfigError> {
        if self.max_selectors == 0 {
            return Err(ConfigError::InvalidMaxSelectors(self.max_selectors));
        }
        FileNameTemplate::parse(&self.file_name_template)
    }
}
