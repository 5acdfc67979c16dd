//! JSON file state store
//!
//! `following.json` holds the followed accounts, either as an array of
//! identifiers or as an object keyed by identifier. `retweeted.json` holds an
//! array of tweet ids. Numbers are accepted in both and read as strings.

use async_trait::async_trait;
use retweet_bot_domain::{
    AccountId, FollowedAccounts, IdentifierKind, PersistedState, RetweetedRecords, StateStore,
    StorageError, TweetId,
};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Locations of the two state documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub following: PathBuf,
    pub retweeted: PathBuf,
}

impl StatePaths {
    /// Standard file names inside a data directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            following: dir.join("following.json"),
            retweeted: dir.join("retweeted.json"),
        }
    }
}

/// State store backed by two JSON files
pub struct JsonStateStore {
    paths: StatePaths,
    identifier_kind: IdentifierKind,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(u64),
}

impl IdRepr {
    fn into_string(self) -> String {
        match self {
            IdRepr::Text(s) => s.trim().to_string(),
            IdRepr::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FollowingDocument {
    List(Vec<IdRepr>),
    Map(serde_json::Map<String, serde_json::Value>),
}

impl JsonStateStore {
    pub fn new(paths: StatePaths) -> Self {
        Self {
            paths,
            identifier_kind: IdentifierKind::default(),
        }
    }

    /// How followed accounts are written in `following.json`
    pub fn with_identifier_kind(mut self, kind: IdentifierKind) -> Self {
        self.identifier_kind = kind;
        self
    }

    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Create empty documents for any that do not exist yet.
    ///
    /// Existing files are never touched. Returns the paths that were created.
    pub async fn init(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut created = Vec::new();

        for path in [&self.paths.following, &self.paths.retweeted] {
            match fs::metadata(path).await {
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(path, e)),
            }

            write_atomic(path, "[]\n").await?;
            tracing::info!(path = %path.display(), "Created empty state file");
            created.push(path.clone());
        }

        Ok(created)
    }

    async fn load_followed(&self) -> Result<FollowedAccounts, StorageError> {
        let path = &self.paths.following;
        let content = read_document(path).await?;

        let document: FollowingDocument =
            serde_json::from_str(&content).map_err(|e| malformed(path, e.to_string()))?;

        let kind = self.identifier_kind;
        let ids: Vec<String> = match document {
            FollowingDocument::List(items) => items
                .into_iter()
                .map(|item| kind.normalize(&item.into_string()))
                .collect(),
            FollowingDocument::Map(map) => map.keys().map(|k| kind.normalize(k)).collect(),
        };

        if ids.iter().any(String::is_empty) {
            return Err(malformed(path, "empty account identifier".to_string()));
        }

        Ok(ids.into_iter().map(AccountId::from).collect())
    }

    async fn load_retweeted(&self) -> Result<RetweetedRecords, StorageError> {
        let path = &self.paths.retweeted;
        let content = read_document(path).await?;

        let items: Vec<IdRepr> =
            serde_json::from_str(&content).map_err(|e| malformed(path, e.to_string()))?;

        let ids: Vec<String> = items.into_iter().map(IdRepr::into_string).collect();
        if ids.iter().any(String::is_empty) {
            return Err(malformed(path, "empty tweet id".to_string()));
        }

        Ok(ids.into_iter().map(TweetId::from).collect())
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<PersistedState, StorageError> {
        let followed = self.load_followed().await?;
        let retweeted = self.load_retweeted().await?;

        tracing::debug!(
            following = %self.paths.following.display(),
            retweeted = %self.paths.retweeted.display(),
            followed_count = followed.len(),
            retweeted_count = retweeted.len(),
            "Loaded state files"
        );

        Ok(PersistedState {
            followed,
            retweeted,
        })
    }

    async fn save_retweeted(&self, retweeted: &RetweetedRecords) -> Result<(), StorageError> {
        let path = &self.paths.retweeted;
        let ids: Vec<&str> = retweeted.iter().map(TweetId::as_str).collect();

        let mut content =
            serde_json::to_string_pretty(&ids).map_err(|e| malformed(path, e.to_string()))?;
        content.push('\n');

        write_atomic(path, &content).await?;

        tracing::debug!(path = %path.display(), count = ids.len(), "Saved retweeted records");
        Ok(())
    }
}

async fn read_document(path: &Path) -> Result<String, StorageError> {
    fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            StorageError::Missing {
                path: path.display().to_string(),
            }
        } else {
            io_error(path, e)
        }
    })
}

/// Write to a sibling temp file, then rename over the target
async fn write_atomic(path: &Path, content: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)
        .await
        .map_err(|e| io_error(&tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| io_error(path, e))?;

    Ok(())
}

fn io_error(path: &Path, error: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

fn malformed(path: &Path, message: String) -> StorageError {
    StorageError::Malformed {
        path: path.display().to_string(),
        message,
    }
}
