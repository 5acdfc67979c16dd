//! In-memory state store for testing and offline mode

use async_trait::async_trait;
use retweet_bot_domain::{
    FollowedAccounts, PersistedState, RetweetedRecords, StateStore, StorageError,
};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory state store implementation
pub struct InMemoryStateStore {
    state: RwLock<PersistedState>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryStateStore {
    pub fn new(followed: FollowedAccounts, retweeted: RetweetedRecords) -> Self {
        Self {
            state: RwLock::new(PersistedState {
                followed,
                retweeted,
            }),
            fail_saves: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    /// Make subsequent saves fail (for exercising the persist error path)
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn retweeted(&self) -> Result<RetweetedRecords, StorageError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.retweeted.clone())
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new(FollowedAccounts::new(), RetweetedRecords::new())
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self) -> Result<PersistedState, StorageError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.clone())
    }

    async fn save_retweeted(&self, retweeted: &RetweetedRecords) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: "memory".to_string(),
                message: "save disabled".to_string(),
            });
        }

        let mut state = self.state.write().map_err(poisoned)?;
        state.retweeted = retweeted.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Io {
        path: "memory".to_string(),
        message: e.to_string(),
    }
}
