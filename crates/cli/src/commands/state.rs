//! State command - create and inspect the state files

use anyhow::{Context, Result};
use retweet_bot_domain::{AccountId, StateStore};
use serde::Serialize;

use crate::args::{StateArgs, StateCommands};
use crate::commands::state_store;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct StateSummary<'a> {
    following_path: String,
    retweeted_path: String,
    followed: Vec<&'a str>,
    retweeted_count: usize,
}

pub async fn execute(args: StateArgs, config: &AppConfig) -> Result<()> {
    match args.command {
        StateCommands::Init => init_state(config).await,
        StateCommands::Show { json } => show_state(config, json).await,
    }
}

async fn init_state(config: &AppConfig) -> Result<()> {
    let store = state_store(config)?;
    let created = store
        .init()
        .await
        .context("Failed to initialize state files")?;

    if created.is_empty() {
        println!(
            "State files already exist in {}",
            config.general.data_dir.display()
        );
        return Ok(());
    }

    for path in &created {
        println!("Created state file: {}", path.display());
    }
    println!();
    println!("Next steps:");
    println!(
        "  1. Add the accounts to follow to {}",
        store.paths().following.display()
    );
    println!("  2. Run 'retweet-bot doctor' to validate your setup");

    Ok(())
}

async fn show_state(config: &AppConfig, json: bool) -> Result<()> {
    let store = state_store(config)?;
    let state = store.load().await.context("Failed to load state files")?;

    let summary = StateSummary {
        following_path: store.paths().following.display().to_string(),
        retweeted_path: store.paths().retweeted.display().to_string(),
        followed: state.followed.iter().map(AccountId::as_str).collect(),
        retweeted_count: state.retweeted.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Followed accounts ({}):", summary.followed.len());
    for account in &summary.followed {
        println!("  {}", account);
    }
    println!();
    println!("Retweeted records: {}", summary.retweeted_count);

    Ok(())
}
