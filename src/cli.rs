// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `nbdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nbdag",
    version,
    about = "Compile a tagged notebook into an executable pipeline definition.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the tagged cell document (JSON).
    ///
    /// The document holds the pipeline configuration plus the ordered list
    /// of `(tags, source)` cell records produced by the notebook reader.
    /// Required unless `--list-marshal-backends` is given.
    #[arg(long, value_name = "PATH")]
    pub cells: Option<String>,

    /// Where to write the generated pipeline source.
    ///
    /// If omitted, the generated source is written to stdout.
    #[arg(long, value_name = "PATH")]
    pub out: Option<String>,

    /// Parse + validate + resolve, print the step graph, but emit nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the registered marshalling backends and exit.
    #[arg(long)]
    pub list_marshal_backends: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `NBDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
