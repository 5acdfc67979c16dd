//! Decision pipeline - picks which candidates to act on

use std::collections::HashSet;

use crate::{
    model::{CandidateTweet, FollowedAccounts, RetweetedRecords, TweetId},
    policy::CandidateFilter,
};

/// Filters a candidate batch down to the tweets to retweet.
///
/// A candidate is selected iff its id is not already retweeted, its author is
/// followed, and every extra filter accepts it. Input order is preserved.
#[derive(Default)]
pub struct DecisionPipeline {
    filters: Vec<Box<dyn CandidateFilter>>,
}

impl DecisionPipeline {
    /// Pipeline with only the two mandatory rules
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(filters: Vec<Box<dyn CandidateFilter>>) -> Self {
        Self { filters }
    }

    pub fn select(
        &self,
        candidates: Vec<CandidateTweet>,
        followed: &FollowedAccounts,
        already_retweeted: &RetweetedRecords,
    ) -> Vec<CandidateTweet> {
        let mut seen: HashSet<TweetId> = HashSet::new();

        candidates
            .into_iter()
            .filter(|c| {
                if already_retweeted.contains(&c.id) {
                    tracing::debug!(tweet_id = %c.id, "Skipped: already retweeted");
                    return false;
                }
                if !followed.contains(&c.author_id) {
                    tracing::debug!(
                        tweet_id = %c.id,
                        author_id = %c.author_id,
                        "Skipped: author not followed"
                    );
                    return false;
                }
                if let Some(filter) = self.filters.iter().find(|f| !f.accept(c)) {
                    tracing::debug!(tweet_id = %c.id, filter = filter.name(), "Skipped by filter");
                    return false;
                }
                seen.insert(c.id.clone())
            })
            .collect()
    }
}
