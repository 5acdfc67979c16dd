//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{CandidateTweet, PersistedState, RetweetedRecords, TweetId};

/// Error type for platform API calls
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited, retry after: {0:?}")]
    RateLimited(Option<std::time::Duration>),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// A single recent-search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Query string in the platform's search syntax
    pub query: String,
    /// Maximum number of tweets to return
    pub max_results: u32,
    /// Inclusive lower bound on tweet creation time
    pub start_time: Option<OffsetDateTime>,
    /// Exclusive upper bound on tweet creation time
    pub end_time: Option<OffsetDateTime>,
}

/// Port for searching tweets
#[async_trait]
pub trait TweetSearch: Send + Sync {
    /// Run one search and return a finite, already materialized batch
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateTweet>, ApiError>;
}

/// Port for the retweet action
#[async_trait]
pub trait Retweeter: Send + Sync {
    async fn retweet(&self, tweet_id: &TweetId) -> Result<(), ApiError>;
}

/// Error type for state store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("State file not found: {path}")]
    Missing { path: String },
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },
    #[error("Malformed state file {path}: {message}")]
    Malformed { path: String, message: String },
}

/// Port for the persisted followed/retweeted sets
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load followed accounts and retweeted records
    async fn load(&self) -> Result<PersistedState, StorageError>;

    /// Overwrite the retweeted records document
    async fn save_retweeted(&self, retweeted: &RetweetedRecords) -> Result<(), StorageError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
