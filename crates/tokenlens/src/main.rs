//! Tokenlens command-line interface

mod cli;
mod commands;
mod logging;

use crate::cli::{Cli, Command};
use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tokenlens_config::{ApplicationConfig, ConfigurationLoader, EnvironmentSource};
use tokenlens_limits::LimitChecker;
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    tokenlens_common::initialize_environment();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(log_dir) = cli.log_dir {
        config.telemetry.log_dir = Some(log_dir);
    }
    let _guards = logging::init(&config.telemetry, matches!(cli.command, Command::Serve(_)))?;
    debug!(command = ?cli.command, "Configuration loaded");

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Check(args) => {
            let checker = LimitChecker::from_config(&config)?;
            commands::check(&checker, &args, std::io::stdin().lock(), &mut stdout)
        }
        Command::Models(args) => {
            let checker = LimitChecker::from_config(&config)?;
            commands::models(&checker, &args, &mut stdout)
        }
        Command::Providers(output) => {
            let checker = LimitChecker::from_config(&config)?;
            commands::providers(&checker, output, &mut stdout)
        }
        Command::Serve(args) => {
            drop(stdout);
            commands::serve(config, &args).await
        }
        Command::FetchTokenizer(args) => {
            let checker = LimitChecker::from_config(&config)?;
            commands::fetch_tokenizer(&checker, &args, &mut stdout).await
        }
    }
}

/// Defaults, then the optional file, then `TOKENLENS_*` variables
fn load_config(path: Option<&Path>) -> Result<ApplicationConfig> {
    let mut loader = ConfigurationLoader::new().add_source(Box::new(EnvironmentSource));
    if let Some(path) = path {
        loader = loader.with_file(path)?;
    }
    Ok(loader.load()?)
}
