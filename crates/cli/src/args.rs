//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// retweet-bot: retweet keyword-matching posts from followed accounts
#[derive(Parser, Debug)]
#[command(name = "retweet-bot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Options for the implicit `run` when no subcommand is given
    #[command(flatten)]
    pub run: RunArgs,

    /// Defaults to `run` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search, select and retweet once, then exit
    Run(RunArgs),

    /// Validate configuration, credentials and state files
    Doctor(DoctorArgs),

    /// Manage the persisted state files
    State(StateArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Select candidates without retweeting or saving
    #[arg(long)]
    pub dry_run: bool,

    /// Credential and keyword profile (reads API_KEY_<PROFILE> etc.)
    #[arg(long, env = "RETWEET_BOT_PROFILE")]
    pub profile: Option<String>,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Credential profile to check
    #[arg(long)]
    pub profile: Option<String>,

    /// Also call the API to verify the credentials
    #[arg(long)]
    pub connect: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommands,
}

#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Create empty state files where missing
    Init,

    /// Print followed accounts and retweeted counts
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
