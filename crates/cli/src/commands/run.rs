//! Run command - one search/select/retweet job

use anyhow::{Context, Result, bail};
use retweet_bot_adapters::x::{XCredentials, XRetweeter, XSearchClient};
use retweet_bot_domain::{
    ApiError, SystemClock,
    policy::FilterConfig,
    query::QueryConfig,
    usecases::{ExecuteConfig, RetweetJob, RetweetJobConfig},
};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use crate::args::RunArgs;
use crate::commands::{parse_identifier_kind, parse_utc_offset, state_store};
use crate::config::AppConfig;

pub async fn execute(args: RunArgs, config: AppConfig) -> Result<()> {
    let profile = args.profile.as_deref();
    let job_config = job_config(&config, profile, args.dry_run)?;

    // Credentials are checked before any API call
    let credentials = XCredentials::from_env(profile).context("Failed to load X credentials")?;

    run_job(&config, job_config, credentials).await
}

async fn run_job(
    config: &AppConfig,
    job_config: RetweetJobConfig,
    credentials: XCredentials,
) -> Result<()> {
    tracing::info!(
        label = %job_config.label,
        dry_run = job_config.dry_run,
        data_dir = %config.general.data_dir.display(),
        keywords = ?job_config.query.keywords,
        retweet_limit = ?job_config.execute.retweet_limit,
        "Starting retweet-bot run"
    );

    let timeout = Duration::from_secs(config.x.timeout_secs);
    let identifier_kind = parse_identifier_kind(&config.search.identifier_type)?;

    let retweeter = Arc::new(
        XRetweeter::with_base_url(&credentials, config.x.base_url.clone(), timeout)
            .context("Failed to initialize retweet client")?,
    );

    // Rejected user credentials end the run instead of failing every retweet
    if !job_config.dry_run {
        match retweeter.verify().await {
            Ok(user) => tracing::debug!(username = %user.username, "Bot account verified"),
            Err(ApiError::Auth(message)) => {
                bail!("X rejected the user credentials for {}: {}", job_config.label, message)
            }
            Err(e) => return Err(e).context("Failed to verify the bot account"),
        }
    }

    let search = Arc::new(
        XSearchClient::with_base_url(
            credentials.bearer_token,
            identifier_kind,
            config.x.base_url.clone(),
            timeout,
        )
        .context("Failed to initialize search client")?,
    );
    let state_store = Arc::new(state_store(config)?);
    let clock = Arc::new(SystemClock);

    let job = RetweetJob::new(search, retweeter, state_store, clock, job_config);
    let report = job.run_once().await?;

    tracing::info!(
        run_id = %report.run_id,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "retweet-bot run completed"
    );

    Ok(())
}

/// Recent search only reaches back a week
const LOOKBACK_DAYS: RangeInclusive<u32> = 1..=7;

/// Job configuration for a profile
pub(crate) fn job_config(
    config: &AppConfig,
    profile: Option<&str>,
    dry_run: bool,
) -> Result<RetweetJobConfig> {
    let keywords = config.search.keywords_for(profile)?.to_vec();

    if !LOOKBACK_DAYS.contains(&config.search.lookback_days) {
        bail!(
            "search.lookback_days must be between {} and {}, got {}",
            LOOKBACK_DAYS.start(),
            LOOKBACK_DAYS.end(),
            config.search.lookback_days
        );
    }

    Ok(RetweetJobConfig {
        label: profile
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| "DEFAULT".to_string()),
        query: QueryConfig {
            keywords,
            required_terms: config.search.required_terms.clone(),
            max_users_per_query: config.search.max_users_per_query,
            exclude_retweets: config.search.exclude_retweets,
            exclude_replies: config.search.exclude_replies,
        },
        filters: FilterConfig {
            exclude_keywords: config.filter.exclude_keywords.clone(),
            ignore_patterns: config.filter.ignore_patterns.clone(),
        },
        execute: ExecuteConfig {
            retweet_limit: config.limits.retweet_limit(),
        },
        max_results: config.search.max_results,
        lookback_days: config.search.lookback_days,
        utc_offset: parse_utc_offset(config.search.utc_offset_hours)?,
        dry_run: dry_run || config.general.dry_run,
    })
}
