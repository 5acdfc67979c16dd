//! Doctor command - validate configuration and show status

use anyhow::Result;
use retweet_bot_adapters::x::{XCredentials, XRetweeter};
use retweet_bot_domain::{ApiError, StateStore, StorageError};
use serde::Serialize;
use std::time::Duration;

use crate::args::DoctorArgs;
use crate::commands::{parse_identifier_kind, run::job_config, state_store};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    credentials: CheckResult,
    state: CheckResult,
    connection: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config: Result<AppConfig>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        credentials: CheckResult::error("Not checked"),
        state: CheckResult::error("Not checked"),
        connection: CheckResult::ok("Skipped (use --connect)"),
        overall: "error".to_string(),
    };

    let profile = args.profile.as_deref();

    // Check config
    let config = match config {
        Ok(c) => {
            report.config = check_config(&c, profile);
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    // Check credentials
    let credentials = match XCredentials::from_env(profile) {
        Ok(creds) => {
            report.credentials = CheckResult::ok(format!(
                "All credential variables set ({})",
                profile.unwrap_or("no profile suffix")
            ));
            Some(creds)
        }
        Err(e) => {
            report.credentials = CheckResult::error(e.to_string());
            None
        }
    };

    if let Some(ref config) = config {
        // Check state files
        report.state = check_state(config).await;

        // Check connection
        if args.connect {
            report.connection = match credentials {
                Some(ref creds) => check_connection(config, creds).await,
                None => CheckResult::error("Cannot connect without credentials"),
            };
        }
    }

    // Determine overall status
    let checks = [
        &report.config,
        &report.credentials,
        &report.state,
        &report.connection,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        anyhow::bail!("Doctor found errors");
    }

    Ok(())
}

fn check_config(config: &AppConfig, profile: Option<&str>) -> CheckResult {
    if let Err(e) = parse_identifier_kind(&config.search.identifier_type) {
        return CheckResult::error(e.to_string());
    }

    match job_config(config, profile, false) {
        Ok(job) if job.query.keywords.is_empty() => {
            CheckResult::error(format!("No search keywords for {}", job.label))
        }
        Ok(job) => CheckResult::ok(format!(
            "Profile: {}, Keywords: {}",
            job.label,
            job.query.keywords.join(", ")
        ))
        .with_details(serde_json::json!({
            "label": job.label,
            "keywords": job.query.keywords,
            "required_terms": job.query.required_terms,
            "exclude_keywords": job.filters.exclude_keywords,
            "retweet_limit": job.execute.retweet_limit,
            "dry_run": job.dry_run,
        })),
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

async fn check_state(config: &AppConfig) -> CheckResult {
    let store = match state_store(config) {
        Ok(store) => store,
        Err(e) => return CheckResult::error(e.to_string()),
    };

    match store.load().await {
        Ok(state) if state.followed.is_empty() => CheckResult::warn(format!(
            "No followed accounts in {}",
            store.paths().following.display()
        )),
        Ok(state) => CheckResult::ok(format!(
            "{} followed accounts, {} retweeted records",
            state.followed.len(),
            state.retweeted.len()
        ))
        .with_details(serde_json::json!({
            "followed": state.followed.len(),
            "retweeted": state.retweeted.len(),
        })),
        Err(StorageError::Missing { path }) => CheckResult::error(format!(
            "State file not found: {} (run 'retweet-bot state init')",
            path
        )),
        Err(e) => CheckResult::error(e.to_string()),
    }
}

async fn check_connection(config: &AppConfig, credentials: &XCredentials) -> CheckResult {
    let retweeter = match XRetweeter::with_base_url(
        credentials,
        config.x.base_url.clone(),
        Duration::from_secs(config.x.timeout_secs),
    ) {
        Ok(r) => r,
        Err(e) => return CheckResult::error(e.to_string()),
    };

    match retweeter.verify().await {
        Ok(user) => CheckResult::ok(format!("Authenticated as @{} ({})", user.username, user.id)),
        Err(ApiError::RateLimited(_)) => CheckResult::warn("Rate limited; credentials not verified"),
        Err(e) => CheckResult::error(e.to_string()),
    }
}

fn print_report(report: &DoctorReport) {
    println!("retweet-bot Doctor Report");
    println!("=========================");
    println!();

    print_check("Config", &report.config);
    print_check("Credentials", &report.credentials);
    print_check("State files", &report.state);
    print_check("Connection", &report.connection);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: retweet-bot run --dry-run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
