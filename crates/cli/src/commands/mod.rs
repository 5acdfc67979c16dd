//! Subcommand implementations

pub mod config;
pub mod doctor;
pub mod run;
pub mod state;

use anyhow::{Result, bail};
use retweet_bot_adapters::state::{JsonStateStore, StatePaths};
use retweet_bot_domain::IdentifierKind;
use time::UtcOffset;

use crate::config::AppConfig;

pub(crate) fn state_store(config: &AppConfig) -> Result<JsonStateStore> {
    let kind = parse_identifier_kind(&config.search.identifier_type)?;
    Ok(JsonStateStore::new(StatePaths::in_dir(&config.general.data_dir)).with_identifier_kind(kind))
}

pub(crate) fn parse_identifier_kind(value: &str) -> Result<IdentifierKind> {
    match value.trim() {
        "username" => Ok(IdentifierKind::Username),
        "id" => Ok(IdentifierKind::Id),
        other => bail!("Invalid search.identifier_type: {} (expected username or id)", other),
    }
}

pub(crate) fn parse_utc_offset(hours: i8) -> Result<UtcOffset> {
    UtcOffset::from_hms(hours, 0, 0)
        .map_err(|e| anyhow::anyhow!("Invalid search.utc_offset_hours {}: {}", hours, e))
}
