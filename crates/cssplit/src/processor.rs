//! Orchestration of a split run.
//!
//! [`Splitter`] ties the pieces together: validate options, partition the
//! tree, name and stringify every fragment, link the remainder with
//! `@import`, persist the fragments, and report what happened.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cssplit_core::SyntaxTree;
use cssplit_core::logging::targets;
use cssplit_syntax::{MapOptions, Stringifier, parse_stylesheet};

use crate::error::{ConfigError, Message, Result, Skipped, Warning};
use crate::link::ImportLinker;
use crate::naming::FileNameTemplate;
use crate::options::SplitOptions;
use crate::output::{Artifact, FsStorage, StorageWriter, map_path, persist_all};
use crate::split::{Partitioner, weighted_selector_count};

/// The stylesheet a tree was parsed from. Needed for source maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub contents: String,
}

impl SourceFile {
    /// Create a source file.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Read a source file from disk.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| cssplit_syntax::Error::io(&path, e))?;
        Ok(Self { path, contents })
    }
}

/// One extracted fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Position in extraction order, starting at 0.
    pub index: usize,
    /// The fragment's own tree.
    pub tree: SyntaxTree,
    /// Where the fragment goes, if a destination was configured.
    pub destination: Option<PathBuf>,
    /// Stringified fragment.
    pub css: String,
    /// Source map of `css`, when one was generated.
    pub map: Option<String>,
}

impl Fragment {
    /// File name of the destination, as referenced by `@import`.
    pub fn file_name(&self) -> Option<String> {
        self.destination
            .as_ref()?
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// Result of a split run.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    /// The remainder, with `@import` links inserted.
    pub root: SyntaxTree,
    /// Stringified remainder.
    pub css: String,
    /// Source map of the remainder, when one was generated.
    pub map: Option<String>,
    /// Fragments in extraction order.
    pub fragments: Vec<Fragment>,
    /// Files written by this run.
    pub written: Vec<PathBuf>,
    /// Summary messages.
    pub messages: Vec<Message>,
    /// Non-fatal problems.
    pub warnings: Vec<Warning>,
}

impl SplitOutput {
    fn new(root: SyntaxTree) -> Self {
        Self {
            root,
            css: String::new(),
            map: None,
            fragments: Vec::new(),
            written: Vec::new(),
            messages: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Splits stylesheets according to a set of [`SplitOptions`].
pub struct Splitter {
    options: SplitOptions,
    template: FileNameTemplate,
    partitioner: Partitioner,
    linker: ImportLinker,
    stringifier: Stringifier,
    storage: Arc<dyn StorageWriter>,
}

impl Splitter {
    /// Create a splitter writing to the file system.
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) if the options are invalid.
    pub fn new(options: SplitOptions) -> Result<Self> {
        let template = options.validate()?;
        let partitioner = Partitioner::new(options.max_selectors)?;
        Ok(Self {
            linker: ImportLinker::new(options.preamble),
            stringifier: Stringifier::new(options.output_style),
            options,
            template,
            partitioner,
            storage: Arc::new(FsStorage),
        })
    }

    /// Use another storage backend.
    pub fn with_storage(mut self, storage: Arc<dyn StorageWriter>) -> Self {
        self.storage = storage;
        self
    }

    /// The options in effect.
    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// The storage backend.
    pub fn storage(&self) -> &Arc<dyn StorageWriter> {
        &self.storage
    }

    /// Split an already parsed tree. `destination` is where the remainder
    /// will be written; fragments are named after it.
    pub async fn process(
        &self,
        tree: SyntaxTree,
        destination: Option<&Path>,
    ) -> Result<SplitOutput> {
        self.run(tree, destination, None).await
    }

    /// Parse and split a source file. Source maps point back into it.
    pub async fn process_source(
        &self,
        source: &SourceFile,
        destination: Option<&Path>,
    ) -> Result<SplitOutput> {
        let tree = parse_stylesheet(&source.contents)?;
        self.run(tree, destination, Some(source)).await
    }

    async fn run(
        &self,
        mut tree: SyntaxTree,
        destination: Option<&Path>,
        source: Option<&SourceFile>,
    ) -> Result<SplitOutput> {
        let label = destination
            .or(source.map(|source| source.path.as_path()))
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "stylesheet".to_string());

        let selectors = weighted_selector_count(&tree)?;
        let trees = self.partitioner.partition(&mut tree)?;

        if trees.is_empty() {
            let mut output = SplitOutput::new(tree);
            (output.css, output.map) = self.render(&output.root, destination, source)?;
            self.report(
                &mut output,
                Message::Skipped {
                    selectors,
                    source: label,
                },
            );
            return Ok(output);
        }

        let mut fragments = Vec::with_capacity(trees.len());
        for (index, fragment_tree) in trees.into_iter().enumerate() {
            let fragment_destination = match destination {
                Some(destination) => {
                    let start = self.options.file_name_start_index;
                    let number = index
                        .checked_add(start)
                        .ok_or(ConfigError::StartIndexOverflow(start))?;
                    self.template.destination(destination, number)
                }
                None => None,
            };
            let (css, map) = self.render(&fragment_tree, fragment_destination.as_deref(), source)?;
            fragments.push(Fragment {
                index,
                tree: fragment_tree,
                destination: fragment_destination,
                css,
                map,
            });
        }

        let mut warnings = Vec::new();
        if self.options.emit_import_links {
            let report = self.linker.link(&mut tree, &fragments, Fragment::file_name)?;
            if report.missing > 0 {
                warnings.push(Warning::DestinationMissing {
                    skipped: Skipped::Imports,
                });
            }
        }

        let mut written = Vec::new();
        if self.options.write_fragments {
            if fragments.iter().any(|fragment| fragment.destination.is_none()) {
                warnings.push(Warning::DestinationMissing {
                    skipped: Skipped::Fragments,
                });
            }
            written = persist_all(Arc::clone(&self.storage), artifacts(&fragments)).await?;
        }

        let mut output = SplitOutput::new(tree);
        (output.css, output.map) = self.render(&output.root, destination, source)?;
        output.fragments = fragments;
        output.written = written;
        for warning in warnings {
            tracing::warn!(target: targets::SPLIT, "{warning}");
            output.warnings.push(warning);
        }

        let message = Message::Divided {
            fragments: output.fragments.len(),
            source: label,
            selectors,
        };
        self.report(&mut output, message);
        Ok(output)
    }

    /// Stringify a tree, with a source map when the destination and the
    /// source are both known.
    fn render(
        &self,
        tree: &SyntaxTree,
        destination: Option<&Path>,
        source: Option<&SourceFile>,
    ) -> Result<(String, Option<String>)> {
        let file = destination
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());
        let (Some(file), Some(source)) = (file, source) else {
            return Ok((self.stringifier.stringify(tree)?, None));
        };
        if !self.options.write_source_maps {
            return Ok((self.stringifier.stringify(tree)?, None));
        }

        let source_name = source.path.to_string_lossy();
        let stringified = self.stringifier.stringify_with_map(
            tree,
            &MapOptions {
                file: &file,
                source: &source_name,
                source_contents: Some(&source.contents),
            },
        )?;

        let mut css = stringified.css;
        if !css.is_empty() && !css.ends_with('\n') {
            css.push('\n');
        }
        css.push_str(&format!("/*# sourceMappingURL={file}.map */\n"));
        Ok((css, stringified.map))
    }

    fn report(&self, output: &mut SplitOutput, message: Message) {
        if !self.options.quiet {
            tracing::info!(target: targets::SPLIT, "{message}");
        }
        output.messages.push(message);
    }
}

/// Files to write for a set of fragments: CSS, plus the map when present.
fn artifacts(fragments: &[Fragment]) -> Vec<Artifact> {
    let mut artifacts = Vec::new();
    for fragment in fragments {
        let Some(destination) = &fragment.destination else {
            continue;
        };
        artifacts.push(Artifact::new(destination.clone(), fragment.css.clone()));
        if let Some(map) = &fragment.map {
            artifacts.push(Artifact::new(map_path(destination), map.clone()));
        }
    }
    artifacts
}
