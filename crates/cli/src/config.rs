//! Configuration loading and management

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub filter: FilterSection,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub x: XConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding following.json and retweeted.json
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Append-only log file; empty disables file logging
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Per-profile keyword overrides, keyed by profile name
    #[serde(default = "default_profiles")]
    pub profiles: BTreeMap<String, ProfileConfig>,

    #[serde(default = "default_required_terms")]
    pub required_terms: Vec<String>,

    /// "username" or "id"
    #[serde(default = "default_identifier_type")]
    pub identifier_type: String,

    #[serde(default = "default_max_users_per_query")]
    pub max_users_per_query: usize,

    #[serde(default = "default_max_results")]
    pub max_results: u32,

    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Offset of the local day boundary from UTC
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i8,

    #[serde(default = "default_true")]
    pub exclude_retweets: bool,

    #[serde(default = "default_true")]
    pub exclude_replies: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSection {
    #[serde(default = "default_exclude_keywords")]
    pub exclude_keywords: Vec<String>,

    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Successful retweets per run; 0 disables the limit
    #[serde(default = "default_retweet_limit")]
    pub retweet_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XConfig {
    #[serde(default = "default_x_base_url")]
    pub base_url: String,

    #[serde(default = "default_x_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("./logs/retweeting.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_keywords() -> Vec<String> {
    vec![
        "cover".to_string(),
        "covered".to_string(),
        "歌ってみた".to_string(),
    ]
}

fn default_profiles() -> BTreeMap<String, ProfileConfig> {
    let profile = |keywords: &[&str]| ProfileConfig {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    };

    BTreeMap::from([
        ("COVER".to_string(), profile(&["cover", "covered", "歌ってみた"])),
        ("ORIGINAL".to_string(), profile(&["オリジナル曲", "original"])),
        ("STREAM".to_string(), profile(&["カラオケ", "歌枠"])),
    ])
}

fn default_required_terms() -> Vec<String> {
    vec!["youtu".to_string()]
}

fn default_identifier_type() -> String {
    "username".to_string()
}

fn default_max_users_per_query() -> usize {
    10
}

fn default_max_results() -> u32 {
    10
}

fn default_lookback_days() -> u32 {
    1
}

fn default_utc_offset_hours() -> i8 {
    9
}

fn default_exclude_keywords() -> Vec<String> {
    vec!["万再生".to_string(), "万回再生".to_string()]
}

fn default_retweet_limit() -> usize {
    5
}

fn default_x_base_url() -> String {
    "https://api.twitter.com".to_string()
}

fn default_x_timeout() -> u64 {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            profiles: default_profiles(),
            required_terms: default_required_terms(),
            identifier_type: default_identifier_type(),
            max_users_per_query: default_max_users_per_query(),
            max_results: default_max_results(),
            lookback_days: default_lookback_days(),
            utc_offset_hours: default_utc_offset_hours(),
            exclude_retweets: true,
            exclude_replies: true,
        }
    }
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            exclude_keywords: default_exclude_keywords(),
            ignore_patterns: vec![],
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            retweet_limit: default_retweet_limit(),
        }
    }
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            base_url: default_x_base_url(),
            timeout_secs: default_x_timeout(),
        }
    }
}

impl SearchConfig {
    /// Keywords for a profile; `None` uses the default keyword list.
    ///
    /// Profile names match case-insensitively. An unknown profile is an error.
    pub fn keywords_for(&self, profile: Option<&str>) -> Result<&[String]> {
        let Some(name) = profile else {
            return Ok(&self.keywords);
        };

        match self
            .profiles
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, profile)) => Ok(&profile.keywords),
            None => bail!("No keywords configured for profile '{}' (search.profiles.{})", name, name),
        }
    }
}

impl LimitsConfig {
    pub fn retweet_limit(&self) -> Option<usize> {
        if self.retweet_limit == 0 {
            None
        } else {
            Some(self.retweet_limit)
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("RETWEET_BOT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r##"# retweet-bot configuration
# Every key is optional; values shown are the defaults.
# Override any key with RETWEET_BOT__<SECTION>__<KEY>, e.g. RETWEET_BOT__GENERAL__DRY_RUN=true

[general]
data_dir = "./data"
log_file = "./logs/retweeting.log"
log_level = "info"
dry_run = false

[search]
keywords = ["cover", "covered", "歌ってみた"]
required_terms = ["youtu"]
identifier_type = "username"  # username, id
max_users_per_query = 10
max_results = 10
lookback_days = 1
utc_offset_hours = 9
exclude_retweets = true
exclude_replies = true

# Selected with --profile NAME; credentials then come from API_KEY_NAME etc.
[search.profiles.COVER]
keywords = ["cover", "covered", "歌ってみた"]

[search.profiles.ORIGINAL]
keywords = ["オリジナル曲", "original"]

[search.profiles.STREAM]
keywords = ["カラオケ", "歌枠"]

[filter]
exclude_keywords = ["万再生", "万回再生"]
# ignore_patterns = ["^RT @", "#PR"]

[limits]
# 0 disables the limit
retweet_limit = 5

[x]
base_url = "https://api.twitter.com"
timeout_secs = 30
"##
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_matches_defaults() {
        let parsed: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(parsed.general.data_dir, defaults.general.data_dir);
        assert_eq!(parsed.search.keywords, defaults.search.keywords);
        assert_eq!(parsed.search.profiles.len(), 3);
        assert_eq!(parsed.search.utc_offset_hours, 9);
        assert_eq!(parsed.filter.exclude_keywords, defaults.filter.exclude_keywords);
        assert_eq!(parsed.limits.retweet_limit(), Some(5));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let parsed: AppConfig = toml::from_str("").unwrap();

        assert_eq!(parsed.search.required_terms, vec!["youtu"]);
        assert_eq!(parsed.search.identifier_type, "username");
        assert!(!parsed.general.dry_run);
    }

    #[test]
    fn test_keywords_for_profile() {
        let search = SearchConfig::default();

        assert_eq!(search.keywords_for(None).unwrap(), search.keywords.as_slice());
        assert_eq!(
            search.keywords_for(Some("stream")).unwrap(),
            ["カラオケ", "歌枠"]
        );
        assert!(search.keywords_for(Some("UNKNOWN")).is_err());
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let limits = LimitsConfig { retweet_limit: 0 };
        assert_eq!(limits.retweet_limit(), None);
    }
}
