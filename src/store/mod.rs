//! Client-local persistence.
//!
//! A directory of JSON documents, one file per key. Documents carry no schema
//! version: a document that no longer parses is deleted and treated as absent.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SAVED_FILTERS_KEY: &str = "savedFilters";
pub const SEARCH_HISTORY_KEY: &str = "searchHistory";
pub const FAVORITES_KEY: &str = "favorites";
pub const FAVORITE_COLLECTIONS_KEY: &str = "favoriteCollections";
pub const FAVORITE_NOTES_KEY: &str = "favoriteNotes";
pub const SESSION_KEY: &str = "session";

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Read a document. Missing and corrupt documents both yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {}", path.display(), err);
                }
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Discarding corrupt local data under '{}': {}", key, err);
                if let Err(err) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to delete {}: {}", path.display(), err);
                }
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let json = serde_json::to_string_pretty(value)?;
        tokio::fs::write(self.path_for(key), json).await?;
        debug!("Persisted local key '{}'", key);
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store.set("numbers", &vec![1, 2, 3]).await.unwrap();
        let back: Option<Vec<i32>> = store.get("numbers").await;

        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn corrupt_document_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let value: Option<Vec<String>> = store.get("broken").await;

        assert!(value.is_none());
        assert!(!dir.path().join("broken.json").exists());
    }

    #[tokio::test]
    async fn removing_missing_key_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested"));
        store.remove("nothing").await.unwrap();
    }
}
