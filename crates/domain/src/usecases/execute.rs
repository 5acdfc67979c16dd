//! Action executor - performs retweets for the selected candidates

use crate::{
    model::{ActionOutcome, CandidateTweet, RetweetedRecords},
    ports::Retweeter,
};

/// Characters of tweet text included in log lines
const PREVIEW_CHARS: usize = 50;

/// Configuration for the action executor
#[derive(Debug, Clone, Default)]
pub struct ExecuteConfig {
    /// Stop after this many successful retweets (None = unlimited)
    pub retweet_limit: Option<usize>,
}

/// Retweets candidates in order, tolerating per-item failures
pub struct ActionExecutor<'a, R: Retweeter + ?Sized> {
    retweeter: &'a R,
    config: ExecuteConfig,
}

impl<'a, R: Retweeter + ?Sized> ActionExecutor<'a, R> {
    pub fn new(retweeter: &'a R, config: ExecuteConfig) -> Self {
        Self { retweeter, config }
    }

    /// Attempt each selected tweet in order.
    ///
    /// Only successful ids are added to the returned records. Persisting them
    /// is left to the caller so that it happens once per batch.
    pub async fn execute(
        &self,
        selected: Vec<CandidateTweet>,
        mut state: RetweetedRecords,
    ) -> (RetweetedRecords, Vec<ActionOutcome>) {
        let mut outcomes = Vec::with_capacity(selected.len());
        let mut succeeded = 0usize;

        for tweet in selected {
            if let Some(limit) = self.config.retweet_limit {
                if succeeded >= limit {
                    tracing::info!(limit = limit, "Retweet limit reached");
                    break;
                }
            }

            match self.retweeter.retweet(&tweet.id).await {
                Ok(()) => {
                    state.insert(tweet.id.clone());
                    succeeded += 1;
                    tracing::info!(
                        tweet_id = %tweet.id,
                        author_id = %tweet.author_id,
                        preview = %tweet.preview(PREVIEW_CHARS),
                        "Retweeted"
                    );
                    outcomes.push(ActionOutcome::retweeted(tweet.id));
                }
                Err(e) => {
                    tracing::error!(tweet_id = %tweet.id, error = %e, "Retweet failed");
                    outcomes.push(ActionOutcome::failed(tweet.id, e.to_string()));
                }
            }
        }

        (state, outcomes)
    }
}
