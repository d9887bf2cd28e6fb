//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// siemnorm -- normalize vendor security events into the canonical schema.
///
/// Use `siemnorm <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "siemnorm", version, about, long_about = None)]
pub struct Cli {
    /// Path to the siemnorm.toml configuration file (defaults apply when missing).
    #[arg(short, long, global = true, default_value = "siemnorm.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for reports.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transform Deep Security events read as JSON lines.
    Transform(TransformArgs),

    /// Parse a single key=value attribute body.
    Parse(ParseArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- transform ----

/// Read records as JSON lines, transform them, and write the results to stdout.
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Input file with one record per line (`-` or omitted reads stdin).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Pretty-print each transformed record.
    #[arg(long)]
    pub pretty: bool,
}

impl TransformArgs {
    /// Input file path, or `None` when reading stdin.
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input
            .as_ref()
            .filter(|path| path.as_os_str() != "-")
    }
}

// ---- parse ----

/// Run the attribute parser on a raw body.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Attribute body, e.g. `src=1.1.1.1 dst=2.2.2.2 act=Accept`.
    pub body: String,
}

// ---- config ----

/// Manage siemnorm configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, deepsecurity).
        #[arg(long)]
        section: Option<String>,
    },
}
