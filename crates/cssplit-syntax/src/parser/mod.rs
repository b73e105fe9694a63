//! CSS parsing module.

mod css_parser;

pub use css_parser::{parse_file, parse_stylesheet};
