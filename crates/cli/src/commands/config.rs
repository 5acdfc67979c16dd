//! Config command - configuration management

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tokio::fs;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(path, force).await,
    }
}

async fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if fs::try_exists(&path).await.unwrap_or(false) && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let content = AppConfig::example_toml();
    toml::from_str::<AppConfig>(&content).context("Example configuration does not parse")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    tracing::info!(path = %path.display(), "Wrote example configuration");

    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the config file to set your keywords and profiles");
    println!("  2. Put API_KEY, API_SECRET, ACCESS_TOKEN, ACCESS_SECRET and BEARER_TOKEN in .env");
    println!("  3. Run 'retweet-bot state init' and list accounts in following.json");
    println!("  4. Run 'retweet-bot run --dry-run' to test");

    Ok(())
}
