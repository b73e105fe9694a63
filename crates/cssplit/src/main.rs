//! cssplit command line.
//!
//! Splits a stylesheet into files of at most `--max-selectors` selectors and
//! writes the remainder, linked to the fragments with `@import`, to `--output`
//! (or stdout).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use cssplit::{
    Error, OutputStyle, PreamblePolicy, SourceFile, SplitOptions, Splitter,
    map_path,
};

/// cssplit - keep stylesheets under a selector limit
#[derive(Parser, Debug)]
#[command(name = "cssplit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Stylesheet to split
    input: PathBuf,

    /// Where to write the remainder; fragments are written next to it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of selectors per file
    #[arg(long)]
    max_selectors: Option<usize>,

    /// Fragment file name template (placeholders: %original%, %i%)
    #[arg(long = "file-name")]
    file_name: Option<String>,

    /// Number of the first fragment
    #[arg(long)]
    start_index: Option<usize>,

    /// Do not write fragment files
    #[arg(long)]
    no_write: bool,

    /// Do not write source maps
    #[arg(long)]
    no_source_maps: bool,

    /// Do not insert @import directives
    #[arg(long)]
    no_import: bool,

    /// Treatment of @charset directives in the remainder
    #[arg(long, value_enum)]
    preamble: Option<Preamble>,

    /// Write compact CSS
    #[arg(long)]
    compact: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preamble {
    Hoist,
    Preserve,
}

impl From<Preamble> for PreamblePolicy {
    fn from(preamble: Preamble) -> Self {
        match preamble {
            Preamble::Hoist => PreamblePolicy::Hoist,
            Preamble::Preserve => PreamblePolicy::Preserve,
        }
    }
}

impl Cli {
    /// Defaults, overridden by the config file, overridden by flags.
    fn options(&self) -> cssplit::Result<SplitOptions> {
        let mut options = match &self.config {
            Some(path) => SplitOptions::load(path)?,
            None => SplitOptions::default(),
        };

        if let Some(max) = self.max_selectors {
            options.max_selectors = max;
        }
        if let Some(template) = &self.file_name {
            options.file_name_template = template.clone();
        }
        if let Some(start) = self.start_index {
            options.file_name_start_index = start;
        }
        if let Some(preamble) = self.preamble {
            options.preamble = preamble.into();
        }
        if self.no_write {
            options.write_fragments = false;
        }
        if self.no_source_maps {
            options.write_source_maps = false;
        }
        if self.no_import {
            options.emit_import_links = false;
        }
        if self.compact {
            options.output_style = OutputStyle::Compact;
        }
        if self.quiet {
            options.quiet = true;
        }
        Ok(options)
    }
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> cssplit::Result<()> {
    let options = cli.options()?;
    let splitter = Splitter::new(options)?;
    let source = SourceFile::read(&cli.input)?;

    let output = splitter
        .process_source(&source, cli.output.as_deref())
        .await?;

    match &cli.output {
        Some(path) => {
            let storage = splitter.storage();
            storage
                .write(path, &output.css)
                .map_err(|source| Error::Persistence {
                    path: path.clone(),
                    source,
                })?;
            if let Some(map) = &output.map {
                let map_file = map_path(path);
                storage
                    .write(&map_file, map)
                    .map_err(|source| Error::Persistence {
                        path: map_file.clone(),
                        source,
                    })?;
            }
        }
        None => print!("{}", output.css),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
