//! Recent search adapter

use async_trait::async_trait;
use reqwest::Client;
use retweet_bot_domain::{
    AccountId, ApiError, CandidateTweet, IdentifierKind, SearchQuery, TweetId, TweetSearch,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use super::{DEFAULT_BASE_URL, check_response, http_client};

/// The recent search endpoint accepts 10..=100 results per page
const MIN_RESULTS: u32 = 10;
const MAX_RESULTS: u32 = 100;

/// X API v2 recent search, authenticated with the app bearer token
pub struct XSearchClient {
    client: Client,
    bearer_token: SecretString,
    base_url: String,
    identifier_kind: IdentifierKind,
}

impl XSearchClient {
    pub fn new(bearer_token: SecretString, identifier_kind: IdentifierKind) -> Result<Self, ApiError> {
        Self::with_base_url(
            bearer_token,
            identifier_kind,
            DEFAULT_BASE_URL.to_string(),
            Duration::from_secs(30),
        )
    }

    pub fn with_base_url(
        bearer_token: SecretString,
        identifier_kind: IdentifierKind,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client(timeout)?,
            bearer_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            identifier_kind,
        })
    }

    fn query_params(&self, query: &SearchQuery) -> Result<Vec<(&'static str, String)>, ApiError> {
        let mut params = vec![
            ("query", query.query.clone()),
            (
                "max_results",
                query.max_results.clamp(MIN_RESULTS, MAX_RESULTS).to_string(),
            ),
            ("tweet.fields", "author_id,created_at".to_string()),
            ("expansions", "author_id".to_string()),
            ("user.fields", "username".to_string()),
        ];

        if let Some(start) = query.start_time {
            params.push(("start_time", format_time(start)?));
        }
        if let Some(end) = query.end_time {
            params.push(("end_time", format_time(end)?));
        }

        Ok(params)
    }

    /// Author identifier in the same form as the followed accounts
    fn author_of(&self, tweet: &Tweet, usernames: &HashMap<&str, &str>) -> String {
        let author_id = tweet.author_id.as_deref().unwrap_or_default();
        match self.identifier_kind {
            IdentifierKind::Id => author_id.to_string(),
            IdentifierKind::Username => usernames
                .get(author_id)
                .map(|name| IdentifierKind::Username.normalize(name))
                .unwrap_or_else(|| {
                    tracing::debug!(tweet_id = %tweet.id, author_id, "No username in includes");
                    author_id.to_string()
                }),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    meta: Meta,
}

#[derive(Deserialize)]
struct Tweet {
    id: String,
    #[serde(default)]
    text: String,
    author_id: Option<String>,
}

#[derive(Deserialize, Default)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Deserialize)]
struct User {
    id: String,
    username: String,
}

#[derive(Deserialize, Default)]
struct Meta {
    result_count: Option<u32>,
}

#[async_trait]
impl TweetSearch for XSearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateTweet>, ApiError> {
        tracing::info!(query = %query.query, "Searching recent tweets");

        let url = format!("{}/2/tweets/search/recent", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&self.query_params(query)?)
            .header(
                "Authorization",
                format!("Bearer {}", self.bearer_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let response = check_response(response, "Recent search failed").await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Api(format!("Invalid search response: {}", e)))?;

        let usernames: HashMap<&str, &str> = body
            .includes
            .users
            .iter()
            .map(|u| (u.id.as_str(), u.username.as_str()))
            .collect();

        let mut tweets: Vec<CandidateTweet> = body
            .data
            .iter()
            .map(|tweet| {
                CandidateTweet::new(
                    TweetId::new(tweet.id.as_str()),
                    AccountId::new(self.author_of(tweet, &usernames)),
                    tweet.text.as_str(),
                )
            })
            .collect();

        // Oldest first; ids are numeric strings
        tweets.sort_by(|a, b| compare_ids(a.id.as_str(), b.id.as_str()));

        tracing::info!(
            count = tweets.len(),
            result_count = ?body.meta.result_count,
            "Fetched search results"
        );

        Ok(tweets)
    }
}

fn format_time(at: OffsetDateTime) -> Result<String, ApiError> {
    at.to_offset(UtcOffset::UTC)
        .replace_nanosecond(0)
        .map_err(|e| ApiError::Api(e.to_string()))?
        .format(&Rfc3339)
        .map_err(|e| ApiError::Api(format!("Invalid search time: {}", e)))
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
