use crate::error::Result;
use crate::listings::filter::ListingFilters;
use crate::store::{LocalStore, SAVED_FILTERS_KEY};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A named filter state kept on the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub name: String,
    pub filters: ListingFilters,
}

pub struct SavedFilters {
    store: LocalStore,
}

impl SavedFilters {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Vec<SavedFilter> {
        self.store.get(SAVED_FILTERS_KEY).await.unwrap_or_default()
    }

    /// Append a preset. Blank names are ignored; duplicate names are allowed.
    pub async fn save(&self, name: &str, filters: &ListingFilters) -> Result<Vec<SavedFilter>> {
        let mut saved = self.list().await;
        if name.trim().is_empty() {
            return Ok(saved);
        }

        saved.push(SavedFilter {
            name: name.to_string(),
            filters: filters.clone(),
        });
        self.store.set(SAVED_FILTERS_KEY, &saved).await?;
        info!("Saved filter preset '{}'", name);
        Ok(saved)
    }

    pub async fn get(&self, index: usize) -> Option<ListingFilters> {
        self.list().await.into_iter().nth(index).map(|s| s.filters)
    }

    /// First preset with this name
    pub async fn find(&self, name: &str) -> Option<ListingFilters> {
        self.list()
            .await
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| s.filters)
    }

    /// Remove by position; out-of-range indices leave the list unchanged
    pub async fn delete(&self, index: usize) -> Result<Vec<SavedFilter>> {
        let mut saved = self.list().await;
        if index < saved.len() {
            saved.remove(index);
            self.store.set(SAVED_FILTERS_KEY, &saved).await?;
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::filter::{BedroomFilter, SortBy};

    #[tokio::test]
    async fn save_get_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let presets = SavedFilters::new(LocalStore::new(dir.path()));
        let cheap = ListingFilters {
            bedrooms: BedroomFilter::Exactly(1),
            sort_by: SortBy::PriceLow,
            ..Default::default()
        };

        presets.save("cheap singles", &cheap).await.unwrap();
        presets.save("  ", &cheap).await.unwrap();
        presets.save("everything", &ListingFilters::default()).await.unwrap();

        assert_eq!(presets.list().await.len(), 2);
        assert_eq!(presets.get(0).await, Some(cheap.clone()));
        assert_eq!(presets.find("everything").await, Some(ListingFilters::default()));

        let remaining = presets.delete(0).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "everything");
        assert_eq!(presets.delete(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_presets_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("savedFilters.json"), "{\"name\":").unwrap();
        let presets = SavedFilters::new(LocalStore::new(dir.path()));

        assert!(presets.list().await.is_empty());
        assert!(presets.get(0).await.is_none());
    }
}
