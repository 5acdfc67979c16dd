//! Retweet job - one linear run from loading state to saving it

use std::collections::HashSet;
use std::sync::Arc;
use time::UtcOffset;
use uuid::Uuid;

use crate::{
    model::{CandidateTweet, RunReport, TweetId},
    policy::FilterConfig,
    ports::{Clock, Retweeter, SearchQuery, StateStore, StorageError, TweetSearch},
    query::{QueryConfig, QueryError, SearchWindow, build_search_queries},
    usecases::{
        execute::{ActionExecutor, ExecuteConfig},
        select::DecisionPipeline,
    },
};

/// Configuration for a retweet job
#[derive(Debug, Clone)]
pub struct RetweetJobConfig {
    /// Profile label used in log output
    pub label: String,
    pub query: QueryConfig,
    pub filters: FilterConfig,
    pub execute: ExecuteConfig,
    /// Tweets requested per query
    pub max_results: u32,
    /// Days of history to search, ending at local midnight today
    pub lookback_days: u32,
    /// Offset defining "local midnight"
    pub utc_offset: UtcOffset,
    /// Select but do not retweet or save
    pub dry_run: bool,
}

impl Default for RetweetJobConfig {
    fn default() -> Self {
        Self {
            label: "DEFAULT".to_string(),
            query: QueryConfig::default(),
            filters: FilterConfig::default(),
            execute: ExecuteConfig::default(),
            max_results: 10,
            lookback_days: 1,
            utc_offset: UtcOffset::UTC,
            dry_run: false,
        }
    }
}

/// Fatal errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to load state: {0}")]
    Storage(#[source] StorageError),
    #[error("Failed to build search queries: {0}")]
    Query(#[from] QueryError),
    #[error("Search failed for query '{query}': {message}")]
    Search { query: String, message: String },
    #[error("Failed to save retweeted records ({unsaved} new ids not persisted): {source}")]
    Persist {
        unsaved: usize,
        #[source]
        source: StorageError,
    },
}

/// Retweet job orchestrator
pub struct RetweetJob<S, R, St, Cl>
where
    S: TweetSearch + ?Sized,
    R: Retweeter + ?Sized,
    St: StateStore + ?Sized,
    Cl: Clock + ?Sized,
{
    search: Arc<S>,
    retweeter: Arc<R>,
    state_store: Arc<St>,
    clock: Arc<Cl>,
    config: RetweetJobConfig,
    pipeline: DecisionPipeline,
}

impl<S, R, St, Cl> RetweetJob<S, R, St, Cl>
where
    S: TweetSearch + ?Sized,
    R: Retweeter + ?Sized,
    St: StateStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        search: Arc<S>,
        retweeter: Arc<R>,
        state_store: Arc<St>,
        clock: Arc<Cl>,
        config: RetweetJobConfig,
    ) -> Self {
        let pipeline = DecisionPipeline::with_filters(config.filters.build());
        Self {
            search,
            retweeter,
            state_store,
            clock,
            config,
            pipeline,
        }
    }

    /// Run the job once
    pub async fn run_once(&self) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4();
        let started_at = self.clock.now();
        let label = self.config.label.as_str();

        tracing::info!(
            run_id = %run_id,
            label = %label,
            started_at = %started_at,
            dry_run = self.config.dry_run,
            "Retweet job started"
        );

        let state = self.state_store.load().await.map_err(RunError::Storage)?;

        tracing::info!(
            followed = state.followed.len(),
            retweeted = state.retweeted.len(),
            "Loaded state"
        );

        let queries = build_search_queries(&state.followed, &self.config.query)?;

        let window = SearchWindow::previous_days(
            started_at,
            self.config.utc_offset,
            self.config.lookback_days,
        );
        tracing::debug!(start = %window.start, end = %window.end, "Search window");

        let candidates = self.fetch_candidates(queries, window).await?;
        let candidates_fetched = candidates.len();

        let selected = self
            .pipeline
            .select(candidates, &state.followed, &state.retweeted);

        tracing::info!(
            candidates = candidates_fetched,
            selected = selected.len(),
            "Selected candidates"
        );

        let selected_count = selected.len();

        let outcomes = if self.config.dry_run {
            for tweet in &selected {
                tracing::info!(
                    tweet_id = %tweet.id,
                    author_id = %tweet.author_id,
                    preview = %tweet.preview(50),
                    "[DRY RUN] Would retweet"
                );
            }
            vec![]
        } else {
            let before = state.retweeted.len();
            let executor = ActionExecutor::new(self.retweeter.as_ref(), self.config.execute.clone());
            let (updated, outcomes) = executor.execute(selected, state.retweeted).await;

            if let Err(source) = self.state_store.save_retweeted(&updated).await {
                let unsaved = updated.len().saturating_sub(before);
                let ids: Vec<&TweetId> = outcomes
                    .iter()
                    .filter(|o| o.is_success())
                    .map(|o| &o.tweet_id)
                    .collect();
                tracing::error!(
                    error = %source,
                    unsaved = unsaved,
                    tweet_ids = ?ids,
                    "FAILED TO PERSIST RETWEETED RECORDS; these tweets may be retweeted again"
                );
                return Err(RunError::Persist { unsaved, source });
            }

            outcomes
        };

        let report = RunReport {
            run_id,
            label: label.to_string(),
            started_at,
            finished_at: self.clock.now(),
            candidates_fetched,
            selected: selected_count,
            dry_run: self.config.dry_run,
            outcomes,
        };

        tracing::info!(
            run_id = %run_id,
            label = %label,
            candidates = report.candidates_fetched,
            selected = report.selected,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Retweet job finished"
        );

        Ok(report)
    }

    /// Run every query in order and merge results, first occurrence wins
    async fn fetch_candidates(
        &self,
        queries: Vec<String>,
        window: SearchWindow,
    ) -> Result<Vec<CandidateTweet>, RunError> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for query in queries {
            let request = SearchQuery {
                query,
                max_results: self.config.max_results,
                start_time: Some(window.start),
                end_time: Some(window.end),
            };

            tracing::debug!(query = %request.query, "Running search");

            let batch = self
                .search
                .search(&request)
                .await
                .map_err(|e| RunError::Search {
                    query: request.query.clone(),
                    message: e.to_string(),
                })?;

            tracing::debug!(query = %request.query, count = batch.len(), "Search returned");

            candidates.extend(batch.into_iter().filter(|c| seen.insert(c.id.clone())));
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FollowedAccounts, PersistedState, RetweetedRecords};
    use crate::ports::ApiError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;
    use time::macros::datetime;

    struct FakeSearch {
        results: Vec<CandidateTweet>,
        fail: bool,
        queries: Mutex<Vec<SearchQuery>>,
    }

    impl FakeSearch {
        fn returning(results: Vec<CandidateTweet>) -> Self {
            Self {
                results,
                fail: false,
                queries: Mutex::new(vec![]),
            }
        }

        fn failing() -> Self {
            Self {
                results: vec![],
                fail: true,
                queries: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl TweetSearch for FakeSearch {
        async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateTweet>, ApiError> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(ApiError::RateLimited(None));
            }
            Ok(self.results.clone())
        }
    }

    struct FakeRetweeter {
        fail_ids: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRetweeter {
        fn new(fail_ids: &[&str]) -> Self {
            Self {
                fail_ids: fail_ids.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl Retweeter for FakeRetweeter {
        async fn retweet(&self, tweet_id: &TweetId) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(tweet_id.to_string());
            if self.fail_ids.iter().any(|id| id == tweet_id.as_str()) {
                return Err(ApiError::Api("already retweeted".to_string()));
            }
            Ok(())
        }
    }

    struct FakeStateStore {
        state: Mutex<PersistedState>,
        fail_load: bool,
        fail_save: bool,
        saves: Mutex<usize>,
    }

    impl FakeStateStore {
        fn new(followed: &[&str], retweeted: &[&str]) -> Self {
            Self {
                state: Mutex::new(PersistedState {
                    followed: followed.iter().copied().collect::<FollowedAccounts>(),
                    retweeted: retweeted.iter().copied().collect::<RetweetedRecords>(),
                }),
                fail_load: false,
                fail_save: false,
                saves: Mutex::new(0),
            }
        }

        fn retweeted(&self) -> RetweetedRecords {
            self.state.lock().unwrap().retweeted.clone()
        }

        fn saves(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    #[async_trait]
    impl StateStore for FakeStateStore {
        async fn load(&self) -> Result<PersistedState, StorageError> {
            if self.fail_load {
                return Err(StorageError::Missing {
                    path: "retweeted.json".to_string(),
                });
            }
            Ok(self.state.lock().unwrap().clone())
        }

        async fn save_retweeted(&self, retweeted: &RetweetedRecords) -> Result<(), StorageError> {
            if self.fail_save {
                return Err(StorageError::Io {
                    path: "retweeted.json".to_string(),
                    message: "read-only filesystem".to_string(),
                });
            }
            *self.saves.lock().unwrap() += 1;
            self.state.lock().unwrap().retweeted = retweeted.clone();
            Ok(())
        }
    }

    struct FakeClock {
        time: OffsetDateTime,
    }

    impl Clock for FakeClock {
        fn now(&self) -> OffsetDateTime {
            self.time
        }
    }

    fn config() -> RetweetJobConfig {
        RetweetJobConfig {
            query: QueryConfig {
                keywords: vec!["cover".to_string()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn job(
        search: Arc<FakeSearch>,
        retweeter: Arc<FakeRetweeter>,
        store: Arc<FakeStateStore>,
        config: RetweetJobConfig,
    ) -> RetweetJob<FakeSearch, FakeRetweeter, FakeStateStore, FakeClock> {
        let clock = Arc::new(FakeClock {
            time: datetime!(2024-01-15 10:00 UTC),
        });
        RetweetJob::new(search, retweeter, store, clock, config)
    }

    #[tokio::test]
    async fn test_run_once_retweets_and_saves_once() {
        let search = Arc::new(FakeSearch::returning(vec![
            CandidateTweet::new("tw_1", "acct_42", "old"),
            CandidateTweet::new("tw_2", "acct_42", "new"),
            CandidateTweet::new("tw_3", "acct_99", "stranger"),
        ]));
        let retweeter = Arc::new(FakeRetweeter::new(&[]));
        let store = Arc::new(FakeStateStore::new(&["acct_42"], &["tw_1"]));

        let report = job(search.clone(), retweeter.clone(), store.clone(), config())
            .run_once()
            .await
            .unwrap();

        assert_eq!(report.candidates_fetched, 3);
        assert_eq!(report.selected, 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(*retweeter.calls.lock().unwrap(), vec!["tw_2"]);
        assert_eq!(store.saves(), 1);
        assert!(store.retweeted().contains(&TweetId::new("tw_2")));

        let queries = search.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].start_time, Some(datetime!(2024-01-14 00:00 UTC)));
        assert_eq!(queries[0].end_time, Some(datetime!(2024-01-15 00:00 UTC)));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let search = Arc::new(FakeSearch::returning(vec![
            CandidateTweet::new("t1", "a", "one"),
            CandidateTweet::new("t2", "a", "two"),
        ]));
        let retweeter = Arc::new(FakeRetweeter::new(&[]));
        let store = Arc::new(FakeStateStore::new(&["a"], &[]));
        let job = job(search, retweeter.clone(), store.clone(), config());

        let first = job.run_once().await.unwrap();
        let second = job.run_once().await.unwrap();

        assert_eq!(first.selected, 2);
        assert_eq!(second.selected, 0);
        assert_eq!(retweeter.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_failure_is_not_fatal() {
        let search = Arc::new(FakeSearch::returning(vec![
            CandidateTweet::new("t1", "a", "one"),
            CandidateTweet::new("t2", "a", "two"),
            CandidateTweet::new("t3", "a", "three"),
        ]));
        let retweeter = Arc::new(FakeRetweeter::new(&["t2"]));
        let store = Arc::new(FakeStateStore::new(&["a"], &[]));

        let report = job(search, retweeter, store.clone(), config())
            .run_once()
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        let saved = store.retweeted();
        assert!(!saved.contains(&TweetId::new("t2")));
        assert_eq!(saved.len(), 2);
    }

    #[tokio::test]
    async fn test_search_failure_aborts_before_any_retweet() {
        let search = Arc::new(FakeSearch::failing());
        let retweeter = Arc::new(FakeRetweeter::new(&[]));
        let store = Arc::new(FakeStateStore::new(&["a"], &[]));

        let result = job(search, retweeter.clone(), store.clone(), config())
            .run_once()
            .await;

        assert!(matches!(result, Err(RunError::Search { .. })));
        assert!(retweeter.calls.lock().unwrap().is_empty());
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn test_load_failure_aborts() {
        let search = Arc::new(FakeSearch::returning(vec![]));
        let retweeter = Arc::new(FakeRetweeter::new(&[]));
        let mut store = FakeStateStore::new(&["a"], &[]);
        store.fail_load = true;

        let result = job(search.clone(), retweeter, Arc::new(store), config())
            .run_once()
            .await;

        assert!(matches!(result, Err(RunError::Storage(_))));
        assert!(search.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_is_fatal() {
        let search = Arc::new(FakeSearch::returning(vec![CandidateTweet::new(
            "t1", "a", "one",
        )]));
        let retweeter = Arc::new(FakeRetweeter::new(&[]));
        let mut store = FakeStateStore::new(&["a"], &[]);
        store.fail_save = true;

        let result = job(search, retweeter.clone(), Arc::new(store), config())
            .run_once()
            .await;

        assert!(matches!(result, Err(RunError::Persist { unsaved: 1, .. })));
        assert_eq!(retweeter.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_neither_retweets_nor_saves() {
        let search = Arc::new(FakeSearch::returning(vec![CandidateTweet::new(
            "t1", "a", "one",
        )]));
        let retweeter = Arc::new(FakeRetweeter::new(&[]));
        let store = Arc::new(FakeStateStore::new(&["a"], &[]));
        let config = RetweetJobConfig {
            dry_run: true,
            ..config()
        };

        let report = job(search, retweeter.clone(), store.clone(), config)
            .run_once()
            .await
            .unwrap();

        assert_eq!(report.selected, 1);
        assert!(report.outcomes.is_empty());
        assert!(retweeter.calls.lock().unwrap().is_empty());
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn test_no_followed_accounts_is_a_query_error() {
        let search = Arc::new(FakeSearch::returning(vec![]));
        let retweeter = Arc::new(FakeRetweeter::new(&[]));
        let store = Arc::new(FakeStateStore::new(&[], &[]));

        let result = job(search, retweeter, store, config()).run_once().await;

        assert!(matches!(
            result,
            Err(RunError::Query(QueryError::NoAccounts))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_results_across_queries_merge() {
        let search = Arc::new(FakeSearch::returning(vec![CandidateTweet::new(
            "t1", "user0", "one",
        )]));
        let retweeter = Arc::new(FakeRetweeter::new(&[]));
        let followed: Vec<String> = (0..15).map(|i| format!("user{}", i)).collect();
        let followed: Vec<&str> = followed.iter().map(String::as_str).collect();
        let store = Arc::new(FakeStateStore::new(&followed, &[]));

        let report = job(search.clone(), retweeter, store, config())
            .run_once()
            .await
            .unwrap();

        assert_eq!(search.queries.lock().unwrap().len(), 2);
        assert_eq!(report.candidates_fetched, 1);
        assert_eq!(report.succeeded(), 1);
    }
}
