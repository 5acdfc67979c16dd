//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Platform-specific tweet identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TweetId(String);

impl TweetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TweetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TweetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TweetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Account identifier (username or numeric user id, depending on configuration)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AccountId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A tweet returned by a search query, not yet evaluated for action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTweet {
    /// Tweet ID
    pub id: TweetId,
    /// Author identifier
    pub author_id: AccountId,
    /// Tweet text
    pub text: String,
}

impl CandidateTweet {
    pub fn new(id: impl Into<TweetId>, author_id: impl Into<AccountId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            text: text.into(),
        }
    }

    /// Single-line prefix of the text, for log output
    pub fn preview(&self, max_chars: usize) -> String {
        self.text
            .replace(['\n', '\r'], " ")
            .chars()
            .take(max_chars)
            .collect()
    }
}

/// Accounts the bot acts upon.
///
/// Membership is a set, but the first-seen order of the source document is
/// kept so that search queries are built deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowedAccounts {
    ordered: Vec<AccountId>,
    index: HashSet<AccountId>,
}

impl FollowedAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.index.contains(account)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Accounts in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.ordered.iter()
    }

    fn push(&mut self, account: AccountId) {
        if self.index.insert(account.clone()) {
            self.ordered.push(account);
        }
    }
}

impl<A: Into<AccountId>> FromIterator<A> for FollowedAccounts {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        let mut accounts = Self::new();
        for account in iter {
            accounts.push(account.into());
        }
        accounts
    }
}

/// Tweet IDs that have already been retweeted.
///
/// Append-only: there is no removal API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetweetedRecords {
    ids: BTreeSet<TweetId>,
}

impl RetweetedRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &TweetId) -> bool {
        self.ids.contains(id)
    }

    /// Returns true if the id was not already recorded
    pub fn insert(&mut self, id: TweetId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Recorded ids in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &TweetId> {
        self.ids.iter()
    }
}

impl<T: Into<TweetId>> FromIterator<T> for RetweetedRecords {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// State loaded at the start of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub followed: FollowedAccounts,
    pub retweeted: RetweetedRecords,
}

/// Result of a single retweet attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStatus {
    Retweeted,
    Failed { reason: String },
}

/// Per-item outcome recorded by the action executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub tweet_id: TweetId,
    #[serde(flatten)]
    pub status: ActionStatus,
}

impl ActionOutcome {
    pub fn retweeted(tweet_id: TweetId) -> Self {
        Self {
            tweet_id,
            status: ActionStatus::Retweeted,
        }
    }

    pub fn failed(tweet_id: TweetId, reason: impl Into<String>) -> Self {
        Self {
            tweet_id,
            status: ActionStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ActionStatus::Retweeted)
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.status {
            ActionStatus::Retweeted => None,
            ActionStatus::Failed { reason } => Some(reason),
        }
    }
}

/// Summary of one completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Profile label (e.g. "DEFAULT", "COVER")
    pub label: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub candidates_fetched: usize,
    pub selected: usize,
    pub dry_run: bool,
    pub outcomes: Vec<ActionOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn followed_accounts_keep_first_seen_order_and_dedupe() {
        let followed: FollowedAccounts = ["b", "a", "b", "c"].into_iter().collect();

        let order: Vec<_> = followed.iter().map(AccountId::as_str).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(followed.len(), 3);
        assert!(followed.contains(&AccountId::new("a")));
        assert!(!followed.contains(&AccountId::new("z")));
    }

    #[test]
    fn retweeted_records_iterate_sorted() {
        let mut records: RetweetedRecords = ["3", "1"].into_iter().collect();
        assert!(records.insert(TweetId::new("2")));
        assert!(!records.insert(TweetId::new("1")));

        let ids: Vec<_> = records.iter().map(TweetId::as_str).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn preview_flattens_newlines_and_truncates() {
        let tweet = CandidateTweet::new("1", "acct", "line one\nline two");
        assert_eq!(tweet.preview(10), "line one l");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = ActionOutcome::failed(TweetId::new("9"), "gone");
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["tweet_id"], "9");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["reason"], "gone");
        assert!(!outcome.is_success());
        assert_eq!(outcome.reason(), Some("gone"));
    }
}
