use crate::error::Result;
use crate::models::Listing;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Collection name -> ids of the listings grouped under it
pub type Collections = BTreeMap<String, Vec<String>>;

/// Common trait for favorites bookkeeping
/// Implemented on-device (nested collections) and on the hosted table (single tag)
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Mark a listing as favorite; adding twice is a no-op
    async fn add(&self, listing: &Listing) -> Result<()>;

    async fn remove(&self, listing_id: &str) -> Result<()>;

    async fn is_favorite(&self, listing_id: &str) -> Result<bool>;

    async fn favorite_ids(&self) -> Result<Vec<String>>;

    async fn create_collection(&self, name: &str) -> Result<()>;

    /// Group a listing under `name`, creating the collection and the favorite as needed
    async fn add_to_collection(&self, name: &str, listing: &Listing) -> Result<()>;

    async fn remove_from_collection(&self, name: &str, listing_id: &str) -> Result<()>;

    /// Drop the grouping only; members stay favorites
    async fn delete_collection(&self, name: &str) -> Result<()>;

    async fn collections(&self) -> Result<Collections>;

    /// Attach a note; an empty note clears it
    async fn set_note(&self, listing_id: &str, note: &str) -> Result<()>;

    async fn note(&self, listing_id: &str) -> Result<Option<String>>;

    fn source_name(&self) -> &'static str;
}
