use crate::error::Result;
use crate::store::{LocalStore, SEARCH_HISTORY_KEY};
use tracing::info;

pub const MAX_HISTORY: usize = 10;

/// Recent search queries, most recent first
pub struct SearchHistory {
    store: LocalStore,
}

impl SearchHistory {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn entries(&self) -> Vec<String> {
        self.store.get(SEARCH_HISTORY_KEY).await.unwrap_or_default()
    }

    /// Put `query` at the front; repeats move up instead of duplicating
    pub async fn record(&self, query: &str) -> Result<Vec<String>> {
        let mut history = self.entries().await;
        if query.trim().is_empty() {
            return Ok(history);
        }

        history.retain(|item| item != query);
        history.insert(0, query.to_string());
        history.truncate(MAX_HISTORY);

        self.store.set(SEARCH_HISTORY_KEY, &history).await?;
        Ok(history)
    }

    /// Drop the entry at `index`; out-of-range indices leave the history as is
    pub async fn remove(&self, index: usize) -> Result<Vec<String>> {
        let mut history = self.entries().await;
        if index >= history.len() {
            return Ok(history);
        }

        history.remove(index);
        self.store.set(SEARCH_HISTORY_KEY, &history).await?;
        Ok(history)
    }

    pub async fn clear(&self) -> Result<()> {
        info!("Clearing search history");
        self.store.remove(SEARCH_HISTORY_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> (tempfile::TempDir, SearchHistory) {
        let dir = tempfile::tempdir().unwrap();
        let history = SearchHistory::new(LocalStore::new(dir.path()));
        (dir, history)
    }

    #[tokio::test]
    async fn repeats_move_to_front() {
        let (_dir, history) = history();
        history.record("studio").await.unwrap();
        history.record("dorm").await.unwrap();
        let entries = history.record("studio").await.unwrap();

        assert_eq!(entries, vec!["studio", "dorm"]);
        assert_eq!(history.entries().await, entries);
    }

    #[tokio::test]
    async fn remove_drops_one_entry_and_persists() {
        let (dir, history) = history();
        for query in ["pool", "dorm", "studio"] {
            history.record(query).await.unwrap();
        }

        assert_eq!(history.remove(1).await.unwrap(), vec!["studio", "pool"]);
        assert_eq!(history.remove(7).await.unwrap(), vec!["studio", "pool"]);

        let reopened = SearchHistory::new(LocalStore::new(dir.path()));
        assert_eq!(reopened.entries().await, vec!["studio", "pool"]);
    }

    #[tokio::test]
    async fn keeps_ten_and_ignores_blank() {
        let (_dir, history) = history();
        for i in 0..12 {
            history.record(&format!("query {i}")).await.unwrap();
        }
        history.record("   ").await.unwrap();

        let entries = history.entries().await;
        assert_eq!(entries.len(), MAX_HISTORY);
        assert_eq!(entries[0], "query 11");
    }

    #[tokio::test]
    async fn corrupt_history_reads_as_empty() {
        let (dir, history) = history();
        std::fs::write(dir.path().join("searchHistory.json"), "[\"unterminated").unwrap();

        assert!(history.entries().await.is_empty());
        let entries = history.record("house").await.unwrap();
        assert_eq!(entries, vec!["house"]);
    }

    #[tokio::test]
    async fn clear_empties_history() {
        let (_dir, history) = history();
        history.record("pool").await.unwrap();
        history.clear().await.unwrap();
        assert!(history.entries().await.is_empty());
    }
}
