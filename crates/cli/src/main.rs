//! retweet-bot CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};
use config::{AppConfig, GeneralConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Credentials and RETWEET_BOT_PROFILE may come from a .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref());

    // Initialize logging
    let loaded = config.as_ref().ok();
    let log_level = cli
        .log_level
        .as_deref()
        .or(loaded.map(|c| c.general.log_level.as_str()))
        .unwrap_or("info");
    // A broken config still logs to the default file
    let log_file = loaded
        .map(|c| c.general.log_file.clone())
        .unwrap_or_else(|| GeneralConfig::default().log_file);
    init_logging(log_level, Some(&log_file))?;

    // Execute command
    let command = cli.command.unwrap_or(Commands::Run(cli.run));
    let result = match command {
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, config).await,
        Commands::Run(args) => match config {
            Ok(config) => commands::run::execute(args, config).await,
            Err(e) => Err(e),
        },
        Commands::State(args) => match config {
            Ok(config) => commands::state::execute(args, &config).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = &result {
        tracing::error!(error = %format!("{:#}", e), "retweet-bot failed");
    }

    result
}

fn init_logging(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let file_layer = match log_file.filter(|p| !p.as_os_str().is_empty()) {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;

            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(())
}
