//! Fragment file names.
//!
//! A [`FileNameTemplate`] is a file stem pattern with two placeholders:
//! `%original%` (the stem of the original destination) and `%i%` (the
//! fragment index plus the configured start index). The directory and
//! extension always come from the original destination.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Original,
    Index,
}

/// A parsed, validated file name template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FileNameTemplate {
    /// Parse a template such as `%original%-%i%`.
    ///
    /// The template must contain `%i%` so that every fragment gets a distinct
    /// name, and it must name a file, not a path.
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        if template.is_empty() {
            return Err(ConfigError::template(template, "template is empty"));
        }
        if template.contains(['/', '\\']) {
            return Err(ConfigError::template(
                template,
                "template must not contain path separators",
            ));
        }

        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('%') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let Some(close) = after.find('%') else {
                return Err(ConfigError::template(template, "unterminated '%' placeholder"));
            };
            segments.push(match &after[..close] {
                "original" => Segment::Original,
                "i" => Segment::Index,
                other => {
                    return Err(ConfigError::template(
                        template,
                        format!("unknown placeholder '%{other}%'"),
                    ));
                }
            });
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        if !segments.contains(&Segment::Index) {
            return Err(ConfigError::template(
                template,
                "template must contain the '%i%' placeholder",
            ));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template text as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitute the placeholders.
    pub fn render(&self, original: &str, index: usize) -> String {
        let mut name = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => name.push_str(text),
                Segment::Original => name.push_str(original),
                Segment::Index => name.push_str(&index.to_string()),
            }
        }
        name
    }

    /// Destination of fragment `index` next to `original`.
    ///
    /// `index` is the final number substituted for `%i%` (start index already
    /// applied). Returns `None` when `original` has no file name.
    pub fn destination(&self, original: &Path, index: usize) -> Option<PathBuf> {
        let stem = original.file_stem()?.to_string_lossy();
        let mut file_name = self.render(&stem, index);
        if let Some(extension) = original.extension() {
            file_name.push('.');
            file_name.push_str(&extension.to_string_lossy());
        }
        Some(original.with_file_name(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template() {
        let template = FileNameTemplate::parse("%original%-%i%").unwrap();
        assert_eq!(template.render("app", 0), "app-0");
        assert_eq!(
            template.destination(Path::new("dist/app.css"), 3),
            Some(PathBuf::from("dist/app-3.css"))
        );
    }

    #[test]
    fn literal_and_repeated_placeholders() {
        let template = FileNameTemplate::parse("part%i%.%original%.%i%").unwrap();
        assert_eq!(template.render("site", 7), "part7.site.7");
        assert_eq!(
            template.destination(Path::new("site"), 1),
            Some(PathBuf::from("part1.site.1"))
        );
    }

    #[test]
    fn rejects_malformed_templates() {
        for template in ["", "%original%", "%original%-%n%", "%original%-%i", "a/%i%", "a\\%i%"] {
            assert!(
                matches!(
                    FileNameTemplate::parse(template),
                    Err(ConfigError::InvalidTemplate { .. })
                ),
                "template {template:?} should be rejected"
            );
        }
    }

    #[test]
    fn destination_requires_file_name() {
        let template = FileNameTemplate::parse("%i%").unwrap();
        assert_eq!(template.destination(Path::new("/"), 0), None);
    }
}
