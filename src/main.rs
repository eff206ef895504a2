//! focus-harness CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use focus_harness::cli::commands::{list, run};
use focus_harness::cli::{handle_error, Cli, Commands};
use focus_harness::domain::models::Config;
use focus_harness::infrastructure::config::ConfigLoader;
use focus_harness::infrastructure::logging::{LogConfig, LoggerImpl};

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => handle_error(&err, cli.json),
    };

    // Keep the guard alive so buffered file logs are flushed on exit.
    let logging = LogConfig::from_settings(&config.logging).and_then(|log| LoggerImpl::init(&log));
    let _logger = match logging {
        Ok(logger) => logger,
        Err(err) => handle_error(&err, cli.json),
    };

    let result = match &cli.command {
        Commands::List(args) => list::execute(args, cli.json).map(|()| true),
        Commands::Run(args) => run::execute(args, config, cli.json).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => handle_error(&err, cli.json),
    }
}
