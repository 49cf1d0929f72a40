use crate::backend::{decode_rows, Backend, Query, FAVORITES_TABLE};
use crate::error::{Error, Result};
use crate::favorites::traits::{Collections, FavoritesStore};
use crate::models::{Favorite, Listing};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Favorites stored as rows of the hosted `favorites` table
///
/// A row carries at most one collection tag, so adding a listing to a second
/// collection moves it. Collections are the distinct tags across the user's
/// rows; an empty collection only lives in this process until a row is tagged.
pub struct RemoteFavorites {
    backend: Arc<dyn Backend>,
    user_id: String,
    cache: Mutex<Option<Vec<Favorite>>>,
    empty_collections: Mutex<BTreeSet<String>>,
}

impl RemoteFavorites {
    pub fn new(backend: Arc<dyn Backend>, user_id: impl Into<String>) -> Self {
        Self {
            backend,
            user_id: user_id.into(),
            cache: Mutex::new(None),
            empty_collections: Mutex::new(BTreeSet::new()),
        }
    }

    /// The user's favorite rows, oldest first
    pub async fn rows(&self) -> Result<Vec<Favorite>> {
        let mut cache = self.cache.lock().await;
        if let Some(rows) = cache.as_ref() {
            return Ok(rows.clone());
        }

        let query = Query::table(FAVORITES_TABLE)
            .eq("userId", &self.user_id)
            .order("createdAt", true);
        let rows: Vec<Favorite> = decode_rows(self.backend.select(&query).await?)?;
        debug!("Fetched {} favorites for {}", rows.len(), self.user_id);
        *cache = Some(rows.clone());
        Ok(rows)
    }

    async fn row(&self, listing_id: &str) -> Result<Option<Favorite>> {
        Ok(self
            .rows()
            .await?
            .into_iter()
            .find(|f| f.listing_id == listing_id))
    }

    async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    fn row_query(&self, listing_id: &str) -> Query {
        Query::table(FAVORITES_TABLE)
            .eq("userId", &self.user_id)
            .eq("listingId", listing_id)
    }

    async fn update_row(&self, listing_id: &str, changes: Value) -> Result<()> {
        let result = self
            .backend
            .update(&self.row_query(listing_id), changes)
            .await;
        self.invalidate().await;
        result.map(|_| ())
    }
}

#[async_trait]
impl FavoritesStore for RemoteFavorites {
    async fn add(&self, listing: &Listing) -> Result<()> {
        if self.row(&listing.id).await?.is_some() {
            return Ok(());
        }

        let row = json!({
            "userId": self.user_id,
            "listingId": listing.id,
            "note": null,
            "collection": null,
            "createdAt": Utc::now(),
        });
        let result = self.backend.insert(FAVORITES_TABLE, row).await;
        self.invalidate().await;
        result?;
        info!("Added favorite {} for {}", listing.id, self.user_id);
        Ok(())
    }

    async fn remove(&self, listing_id: &str) -> Result<()> {
        let result = self.backend.delete(&self.row_query(listing_id)).await;
        self.invalidate().await;
        result
    }

    async fn is_favorite(&self, listing_id: &str) -> Result<bool> {
        Ok(self.row(listing_id).await?.is_some())
    }

    async fn favorite_ids(&self) -> Result<Vec<String>> {
        Ok(self.rows().await?.into_iter().map(|f| f.listing_id).collect())
    }

    async fn create_collection(&self, name: &str) -> Result<()> {
        let tagged = self
            .rows()
            .await?
            .iter()
            .any(|f| f.collection.as_deref() == Some(name));
        if !tagged {
            self.empty_collections.lock().await.insert(name.to_string());
        }
        Ok(())
    }

    async fn add_to_collection(&self, name: &str, listing: &Listing) -> Result<()> {
        self.add(listing).await?;
        self.update_row(&listing.id, json!({ "collection": name }))
            .await?;
        self.empty_collections.lock().await.remove(name);
        Ok(())
    }

    async fn remove_from_collection(&self, name: &str, listing_id: &str) -> Result<()> {
        match self.row(listing_id).await? {
            Some(row) if row.collection.as_deref() == Some(name) => {
                self.update_row(listing_id, json!({ "collection": null }))
                    .await
            }
            _ => Ok(()),
        }
    }

    /// One update per member row; a failure part-way leaves the rest tagged
    async fn delete_collection(&self, name: &str) -> Result<()> {
        let members: Vec<String> = self
            .rows()
            .await?
            .into_iter()
            .filter(|f| f.collection.as_deref() == Some(name))
            .map(|f| f.listing_id)
            .collect();

        for listing_id in &members {
            self.update_row(listing_id, json!({ "collection": null }))
                .await?;
        }
        self.empty_collections.lock().await.remove(name);
        info!("Deleted collection '{}' ({} members untagged)", name, members.len());
        Ok(())
    }

    async fn collections(&self) -> Result<Collections> {
        let mut collections = Collections::new();
        for name in self.empty_collections.lock().await.iter() {
            collections.insert(name.clone(), Vec::new());
        }
        for row in self.rows().await? {
            if let Some(name) = row.collection {
                collections.entry(name).or_default().push(row.listing_id);
            }
        }
        Ok(collections)
    }

    async fn set_note(&self, listing_id: &str, note: &str) -> Result<()> {
        if self.row(listing_id).await?.is_none() {
            return Err(Error::NotFound {
                entity: "Favorite",
                id: listing_id.to_string(),
            });
        }
        let note = if note.is_empty() { Value::Null } else { json!(note) };
        self.update_row(listing_id, json!({ "note": note })).await
    }

    async fn note(&self, listing_id: &str) -> Result<Option<String>> {
        Ok(self
            .row(listing_id)
            .await?
            .and_then(|f| f.note)
            .filter(|n| !n.is_empty()))
    }

    fn source_name(&self) -> &'static str {
        "remote"
    }
}
