//! X (Twitter) API adapters

mod oauth;
mod retweet;
mod search;

pub use oauth::{OAuthError, OAuthSigner};
pub use retweet::{XRetweeter, XUser};
pub use search::XSearchClient;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use retweet_bot_domain::{ApiError, CandidateTweet, Retweeter, SearchQuery, TweetId, TweetSearch};
use secrecy::SecretString;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// Names of the credential environment variables, without suffix
pub const CREDENTIAL_VARS: [&str; 5] = [
    "API_KEY",
    "API_SECRET",
    "ACCESS_TOKEN",
    "ACCESS_SECRET",
    "BEARER_TOKEN",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Profile suffix must not be empty")]
    EmptySuffix,
    #[error("Missing credential environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
}

/// Credentials for one bot account
pub struct XCredentials {
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub access_token: SecretString,
    pub access_secret: SecretString,
    pub bearer_token: SecretString,
}

impl XCredentials {
    /// Environment variable names for the given profile suffix.
    ///
    /// `None` gives the bare names; `Some("COVER")` gives `API_KEY_COVER` etc.
    pub fn env_names(suffix: Option<&str>) -> Result<Vec<String>, CredentialsError> {
        let suffix_part = match suffix {
            Some(s) if s.trim().is_empty() => return Err(CredentialsError::EmptySuffix),
            Some(s) => format!("_{}", s.trim()),
            None => String::new(),
        };

        Ok(CREDENTIAL_VARS
            .iter()
            .map(|name| format!("{}{}", name, suffix_part))
            .collect())
    }

    /// Read credentials from the process environment
    pub fn from_env(suffix: Option<&str>) -> Result<Self, CredentialsError> {
        Self::from_lookup(suffix, |name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup; empty values count as missing
    pub fn from_lookup(
        suffix: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CredentialsError> {
        let names = Self::env_names(suffix)?;

        let mut values = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in &names {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => values.push(value),
                _ => missing.push(name.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(CredentialsError::Missing(missing));
        }

        let [api_key, api_secret, access_token, access_secret, bearer_token]: [String; 5] =
            values
                .try_into()
                .map_err(|_| CredentialsError::Missing(names.clone()))?;
        let secret = |value: String| SecretString::new(value.into());

        Ok(Self {
            api_key: secret(api_key),
            api_secret: secret(api_secret),
            access_token: secret(access_token),
            access_secret: secret(access_secret),
            bearer_token: secret(bearer_token),
        })
    }
}

/// HTTP client shared by the X adapters
pub(crate) fn http_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))
}

/// Map non-success responses to `ApiError`, passing successful ones through
pub(crate) async fn check_response(response: Response, context: &str) -> Result<Response, ApiError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Auth(format!("{}: invalid credentials", context)));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(|ts| {
                let now = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
                Duration::from_secs(ts.saturating_sub(now))
            });
        return Err(ApiError::RateLimited(retry_after));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Api(format!("{} ({}): {}", context, status, body)));
    }

    Ok(response)
}

/// Stub search for testing and offline runs
pub struct StubSearch {
    tweets: Vec<CandidateTweet>,
}

impl StubSearch {
    /// Create an empty stub
    pub fn empty() -> Self {
        Self { tweets: vec![] }
    }

    /// Create a stub with predefined results
    pub fn with_tweets(tweets: Vec<CandidateTweet>) -> Self {
        Self { tweets }
    }
}

#[async_trait]
impl TweetSearch for StubSearch {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<CandidateTweet>, ApiError> {
        Ok(self.tweets.clone())
    }
}

/// Stub retweeter for testing
pub struct StubRetweeter {
    fail_ids: HashSet<TweetId>,
    retweeted: std::sync::Mutex<Vec<TweetId>>,
}

impl StubRetweeter {
    pub fn new() -> Self {
        Self::failing_on(Vec::<TweetId>::new())
    }

    /// Stub that rejects the given ids
    pub fn failing_on<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TweetId>,
    {
        Self {
            fail_ids: ids.into_iter().map(Into::into).collect(),
            retweeted: std::sync::Mutex::new(vec![]),
        }
    }

    /// Get all ids that were retweeted
    pub fn get_retweeted(&self) -> Vec<TweetId> {
        self.retweeted
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

impl Default for StubRetweeter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retweeter for StubRetweeter {
    async fn retweet(&self, tweet_id: &TweetId) -> Result<(), ApiError> {
        if self.fail_ids.contains(tweet_id) {
            return Err(ApiError::Api(format!("stub refused {}", tweet_id)));
        }

        self.retweeted
            .lock()
            .map_err(|e| ApiError::Api(e.to_string()))?
            .push(tweet_id.clone());
        Ok(())
    }
}
