//! Search query construction

use thiserror::Error;
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::model::{AccountId, FollowedAccounts};

/// How followed accounts are identified in state files and search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierKind {
    /// Account handle without the leading @
    #[default]
    Username,
    /// Numeric user id
    Id,
}

impl IdentifierKind {
    /// Canonical form for comparing identifiers.
    ///
    /// Usernames are case-insensitive on the platform, so they are trimmed,
    /// stripped of a leading `@` and lowercased. Ids are only trimmed.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self {
            IdentifierKind::Username => trimmed.trim_start_matches('@').to_lowercase(),
            IdentifierKind::Id => trimmed.to_string(),
        }
    }
}

/// Configuration for building search queries
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Keywords, OR-ed together
    pub keywords: Vec<String>,
    /// Terms every result must contain
    pub required_terms: Vec<String>,
    /// Accounts per query (the platform caps query length)
    pub max_users_per_query: usize,
    pub exclude_retweets: bool,
    pub exclude_replies: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            keywords: vec![],
            required_terms: vec![],
            max_users_per_query: 10,
            exclude_retweets: true,
            exclude_replies: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("No followed accounts to search")]
    NoAccounts,
    #[error("No search keywords configured")]
    NoKeywords,
}

/// Build one query per chunk of followed accounts
pub fn build_search_queries(
    followed: &FollowedAccounts,
    config: &QueryConfig,
) -> Result<Vec<String>, QueryError> {
    if followed.is_empty() {
        return Err(QueryError::NoAccounts);
    }
    if config.keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(QueryError::NoKeywords);
    }

    let accounts: Vec<&AccountId> = followed.iter().collect();
    let queries = accounts
        .chunks(config.max_users_per_query.max(1))
        .map(|chunk| build_search_query(chunk, config))
        .collect();

    Ok(queries)
}

/// Build a single query for the given accounts
pub fn build_search_query(accounts: &[&AccountId], config: &QueryConfig) -> String {
    let mut parts = Vec::new();

    if !accounts.is_empty() {
        let from = accounts
            .iter()
            .map(|a| format!("from:{}", a))
            .collect::<Vec<_>>()
            .join(" OR ");
        parts.push(format!("({})", from));
    }

    parts.extend(
        config
            .required_terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(quote_term),
    );

    let keywords: Vec<String> = config
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(quote_term)
        .collect();
    if !keywords.is_empty() {
        parts.push(format!("({})", keywords.join(" OR ")));
    }

    if config.exclude_retweets {
        parts.push("-is:retweet".to_string());
    }
    if config.exclude_replies {
        parts.push("-is:reply".to_string());
    }

    parts.join(" ")
}

fn quote_term(term: &str) -> String {
    if term.chars().any(char::is_whitespace) {
        format!("\"{}\"", term.replace('"', ""))
    } else {
        term.to_string()
    }
}

/// Time range passed to the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl SearchWindow {
    /// From local midnight `lookback_days` ago up to local midnight today,
    /// expressed in UTC.
    pub fn previous_days(now: OffsetDateTime, offset: UtcOffset, lookback_days: u32) -> Self {
        let end = now
            .to_offset(offset)
            .date()
            .midnight()
            .assume_offset(offset);
        let start = end - Duration::days(i64::from(lookback_days));

        Self {
            start: start.to_offset(UtcOffset::UTC),
            end: end.to_offset(UtcOffset::UTC),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    fn config(keywords: &[&str]) -> QueryConfig {
        QueryConfig {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_query_layout() {
        let followed: FollowedAccounts = ["alice", "bob"].into_iter().collect();
        let mut config = config(&["cover", "歌ってみた"]);
        config.required_terms = vec!["youtu".to_string()];

        let queries = build_search_queries(&followed, &config).unwrap();

        assert_eq!(
            queries,
            vec!["(from:alice OR from:bob) youtu (cover OR 歌ってみた) -is:retweet -is:reply"]
        );
    }

    #[test]
    fn test_accounts_are_chunked() {
        let followed: FollowedAccounts = (0..25).map(|i| format!("user{}", i)).collect();
        let config = config(&["cover"]);

        let queries = build_search_queries(&followed, &config).unwrap();

        assert_eq!(queries.len(), 3);
        assert!(queries[0].starts_with("(from:user0 OR "));
        assert!(queries[2].starts_with("(from:user20 OR "));
        assert_eq!(queries[2].matches("from:").count(), 5);
    }

    #[test]
    fn test_multiword_keywords_are_quoted() {
        let followed: FollowedAccounts = ["alice"].into_iter().collect();
        let mut config = config(&["original song"]);
        config.exclude_replies = false;

        let queries = build_search_queries(&followed, &config).unwrap();

        assert_eq!(queries[0], "(from:alice) (\"original song\") -is:retweet");
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        let empty = FollowedAccounts::new();
        assert_eq!(
            build_search_queries(&empty, &config(&["cover"])),
            Err(QueryError::NoAccounts)
        );

        let followed: FollowedAccounts = ["alice"].into_iter().collect();
        assert_eq!(
            build_search_queries(&followed, &config(&[" "])),
            Err(QueryError::NoKeywords)
        );
    }

    #[test]
    fn test_usernames_normalize_case_insensitively() {
        assert_eq!(IdentifierKind::Username.normalize(" @Alice_Cover "), "alice_cover");
        assert_eq!(IdentifierKind::Id.normalize(" 12345 "), "12345");
    }

    #[test]
    fn test_previous_day_window_in_jst() {
        // 19:00 JST on Jan 15
        let window = SearchWindow::previous_days(datetime!(2024-01-15 10:00 UTC), offset!(+9), 1);

        assert_eq!(window.start, datetime!(2024-01-13 15:00 UTC));
        assert_eq!(window.end, datetime!(2024-01-14 15:00 UTC));
    }

    #[test]
    fn test_window_follows_local_date_not_utc_date() {
        // 01:00 JST on Jan 16, still Jan 15 in UTC
        let window = SearchWindow::previous_days(datetime!(2024-01-15 16:00 UTC), offset!(+9), 2);

        assert_eq!(window.start, datetime!(2024-01-13 15:00 UTC));
        assert_eq!(window.end, datetime!(2024-01-15 15:00 UTC));
    }
}
