// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `reloadwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reloadwatch",
    version,
    about = "Watch glob patterns and run a reload command once changes settle.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Reloadwatch.toml` in the current working directory. The file
    /// may be absent when at least one `--pattern` is given.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Extra watch pattern, appended to the config file's patterns.
    ///
    /// Relative patterns resolve against the current working directory.
    #[arg(long = "pattern", short = 'p', value_name = "GLOB")]
    pub patterns: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RELOADWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the compiled patterns, but don't watch.
    #[arg(long)]
    pub dry_run: bool,

    /// Reload command, overriding `[reload].cmd`. Run through `sh -c`.
    #[arg(last = true, value_name = "CMD")]
    pub cmd: Vec<String>,
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
