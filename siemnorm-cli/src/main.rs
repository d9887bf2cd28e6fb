//! siemnorm CLI entry point
//!
//! Parses arguments, loads configuration, initializes logging, and dispatches
//! to a command handler. Errors are printed to stderr and mapped to exit codes.

use std::path::Path;

use clap::Parser;

use siemnorm_core::config::{GeneralConfig, SiemnormConfig};
use siemnorm_cli::cli::{Cli, Commands};
use siemnorm_cli::commands;
use siemnorm_cli::error::CliError;
use siemnorm_cli::logging;
use siemnorm_cli::output::OutputWriter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let level = cli.log_level.as_deref();

    match cli.command {
        Commands::Transform(args) => {
            let config = load_config(&cli.config).await?;
            init_logging(&config.general, level)?;
            siemnorm_core::metrics::describe_all();
            commands::transform::execute(args, &config, &writer).await
        }
        Commands::Parse(args) => {
            init_logging(&GeneralConfig::default(), level)?;
            commands::parse::execute(args, &writer)
        }
        Commands::Config(args) => {
            init_logging(&GeneralConfig::default(), level)?;
            commands::config::execute(args, &cli.config, &writer).await
        }
    }
}

/// Load the config file, falling back to defaults and env overrides when it is missing.
async fn load_config(path: &Path) -> Result<SiemnormConfig, CliError> {
    SiemnormConfig::load_or_default(path)
        .await
        .map_err(|e| CliError::Config(e.to_string()))
}

fn init_logging(general: &GeneralConfig, level: Option<&str>) -> Result<(), CliError> {
    let effective = logging::effective_config(general, level);
    logging::init_tracing(&effective).map_err(|e| CliError::Command(e.to_string()))
}
