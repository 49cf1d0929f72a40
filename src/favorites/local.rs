use crate::error::Result;
use crate::favorites::traits::{Collections, FavoritesStore};
use crate::models::Listing;
use crate::store::{LocalStore, FAVORITES_KEY, FAVORITE_COLLECTIONS_KEY, FAVORITE_NOTES_KEY};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct State {
    favorites: Vec<Listing>,
    collections: BTreeMap<String, Vec<Listing>>,
    notes: BTreeMap<String, String>,
}

/// Favorites kept on the device
///
/// Each collection holds its own copies of the listings, so one listing can
/// sit in several collections at once. Every change is written through.
pub struct LocalFavorites {
    store: LocalStore,
    state: Mutex<State>,
}

impl LocalFavorites {
    pub async fn load(store: LocalStore) -> Self {
        let state = State {
            favorites: store.get(FAVORITES_KEY).await.unwrap_or_default(),
            collections: store.get(FAVORITE_COLLECTIONS_KEY).await.unwrap_or_default(),
            notes: store.get(FAVORITE_NOTES_KEY).await.unwrap_or_default(),
        };
        debug!(
            "Loaded {} local favorites in {} collections",
            state.favorites.len(),
            state.collections.len()
        );
        Self {
            store,
            state: Mutex::new(state),
        }
    }

    /// Full copies of the favorited listings, in the order they were added
    pub async fn favorite_listings(&self) -> Vec<Listing> {
        self.state.lock().await.favorites.clone()
    }

    pub async fn collection_listings(&self, name: &str) -> Vec<Listing> {
        self.state
            .lock()
            .await
            .collections
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    async fn save_favorites(&self, state: &State) -> Result<()> {
        self.store.set(FAVORITES_KEY, &state.favorites).await
    }

    async fn save_collections(&self, state: &State) -> Result<()> {
        self.store.set(FAVORITE_COLLECTIONS_KEY, &state.collections).await
    }

    async fn save_notes(&self, state: &State) -> Result<()> {
        self.store.set(FAVORITE_NOTES_KEY, &state.notes).await
    }
}

fn contains(listings: &[Listing], listing_id: &str) -> bool {
    listings.iter().any(|l| l.id == listing_id)
}

#[async_trait]
impl FavoritesStore for LocalFavorites {
    async fn add(&self, listing: &Listing) -> Result<()> {
        let mut state = self.state.lock().await;
        if contains(&state.favorites, &listing.id) {
            return Ok(());
        }
        state.favorites.push(listing.clone());
        self.save_favorites(&state).await
    }

    async fn remove(&self, listing_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.favorites.retain(|l| l.id != listing_id);
        for members in state.collections.values_mut() {
            members.retain(|l| l.id != listing_id);
        }
        state.notes.remove(listing_id);

        self.save_favorites(&state).await?;
        self.save_collections(&state).await?;
        self.save_notes(&state).await
    }

    async fn is_favorite(&self, listing_id: &str) -> Result<bool> {
        Ok(contains(&self.state.lock().await.favorites, listing_id))
    }

    async fn favorite_ids(&self) -> Result<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state.favorites.iter().map(|l| l.id.clone()).collect())
    }

    async fn create_collection(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.collections.contains_key(name) {
            return Ok(());
        }
        state.collections.insert(name.to_string(), Vec::new());
        info!("Created collection '{}'", name);
        self.save_collections(&state).await
    }

    async fn add_to_collection(&self, name: &str, listing: &Listing) -> Result<()> {
        let mut state = self.state.lock().await;
        let members = state.collections.entry(name.to_string()).or_default();
        if !contains(members, &listing.id) {
            members.push(listing.clone());
        }
        if !contains(&state.favorites, &listing.id) {
            state.favorites.push(listing.clone());
        }

        self.save_collections(&state).await?;
        self.save_favorites(&state).await
    }

    async fn remove_from_collection(&self, name: &str, listing_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let Some(members) = state.collections.get_mut(name) else {
            return Ok(());
        };
        members.retain(|l| l.id != listing_id);
        self.save_collections(&state).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.collections.remove(name).is_some() {
            info!("Deleted collection '{}'", name);
        }
        self.save_collections(&state).await
    }

    async fn collections(&self) -> Result<Collections> {
        let state = self.state.lock().await;
        Ok(state
            .collections
            .iter()
            .map(|(name, members)| (name.clone(), members.iter().map(|l| l.id.clone()).collect()))
            .collect())
    }

    async fn set_note(&self, listing_id: &str, note: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if note.is_empty() {
            state.notes.remove(listing_id);
        } else {
            state.notes.insert(listing_id.to_string(), note.to_string());
        }
        self.save_notes(&state).await
    }

    async fn note(&self, listing_id: &str) -> Result<Option<String>> {
        Ok(self.state.lock().await.notes.get(listing_id).cloned())
    }

    fn source_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fallback::static_listings;

    async fn favorites(dir: &tempfile::TempDir) -> LocalFavorites {
        LocalFavorites::load(LocalStore::new(dir.path())).await
    }

    #[tokio::test]
    async fn add_then_remove_toggles_membership() {
        let dir = tempfile::tempdir().unwrap();
        let favs = favorites(&dir).await;
        let listing = &static_listings()[0];

        favs.add(listing).await.unwrap();
        favs.add(listing).await.unwrap();
        assert!(favs.is_favorite(&listing.id).await.unwrap());
        assert_eq!(favs.favorite_ids().await.unwrap().len(), 1);

        favs.remove(&listing.id).await.unwrap();
        assert!(!favs.is_favorite(&listing.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_collection_keeps_favorite() {
        let dir = tempfile::tempdir().unwrap();
        let favs = favorites(&dir).await;
        let listing = &static_listings()[2];

        favs.create_collection("Fall semester").await.unwrap();
        favs.add_to_collection("Fall semester", listing).await.unwrap();
        assert_eq!(
            favs.collections().await.unwrap()["Fall semester"],
            vec![listing.id.clone()]
        );

        favs.delete_collection("Fall semester").await.unwrap();
        assert!(favs.is_favorite(&listing.id).await.unwrap());
        assert!(favs.collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_can_sit_in_several_collections() {
        let dir = tempfile::tempdir().unwrap();
        let favs = favorites(&dir).await;
        let listing = &static_listings()[1];

        favs.add_to_collection("Groups", listing).await.unwrap();
        favs.add_to_collection("Pets", listing).await.unwrap();
        favs.remove_from_collection("Groups", &listing.id).await.unwrap();

        let collections = favs.collections().await.unwrap();
        assert!(collections["Groups"].is_empty());
        assert_eq!(collections["Pets"], vec![listing.id.clone()]);
        assert_eq!(favs.collection_listings("Pets").await[0].title, listing.title);
    }

    #[tokio::test]
    async fn removing_favorite_strips_collections_and_note() {
        let dir = tempfile::tempdir().unwrap();
        let favs = favorites(&dir).await;
        let listing = &static_listings()[3];

        favs.add_to_collection("Cheap", listing).await.unwrap();
        favs.set_note(&listing.id, "ask about meal plan").await.unwrap();
        favs.remove(&listing.id).await.unwrap();

        assert!(favs.collections().await.unwrap()["Cheap"].is_empty());
        assert_eq!(favs.note(&listing.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let listing = &static_listings()[4];
        {
            let favs = favorites(&dir).await;
            favs.add_to_collection("Pool", listing).await.unwrap();
            favs.set_note(&listing.id, "visit saturday").await.unwrap();
        }

        let favs = favorites(&dir).await;
        assert!(favs.is_favorite(&listing.id).await.unwrap());
        assert_eq!(favs.note(&listing.id).await.unwrap().as_deref(), Some("visit saturday"));
        assert_eq!(favs.favorite_listings().await[0].id, listing.id);
    }

    #[tokio::test]
    async fn corrupt_collections_start_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("favoriteCollections.json"), "[[[").unwrap();

        let favs = favorites(&dir).await;
        assert!(favs.collections().await.unwrap().is_empty());
    }
}
