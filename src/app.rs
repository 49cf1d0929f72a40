use crate::auth::AuthService;
use crate::backend::{Backend, HostedBackend, MemoryBackend};
use crate::config::AppConfig;
use crate::error::Result;
use crate::favorites::{FavoritesStore, LocalFavorites, RemoteFavorites};
use crate::listings::{ListingService, SavedFilters, SearchHistory};
use crate::profile::ProfileService;
use crate::store::LocalStore;
use std::sync::Arc;
use tracing::info;

/// Wires the backend, the local store and the services built on them
pub struct App {
    pub config: AppConfig,
    pub backend: Arc<dyn Backend>,
    pub store: LocalStore,
}

impl App {
    /// Hosted backend when configured, static catalogue otherwise
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let backend: Arc<dyn Backend> = match HostedBackend::from_config(&config)? {
            Some(hosted) => Arc::new(hosted),
            None => Arc::new(MemoryBackend::fallback()),
        };
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: AppConfig, backend: Arc<dyn Backend>) -> Self {
        let store = LocalStore::new(config.data_dir.clone());
        info!("Local data in {}", store.root().display());
        Self {
            config,
            backend,
            store,
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.backend.clone(), self.store.clone())
    }

    pub fn listings(&self) -> ListingService {
        ListingService::new(self.backend.clone())
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.backend.clone())
    }

    pub fn history(&self) -> SearchHistory {
        SearchHistory::new(self.store.clone())
    }

    pub fn presets(&self) -> SavedFilters {
        SavedFilters::new(self.store.clone())
    }

    /// Hosted favorites for the signed-in user, or the on-device store
    pub async fn favorites(&self, remote: bool) -> Result<Box<dyn FavoritesStore>> {
        if remote {
            let user_id = self.auth().require_user().await?;
            Ok(Box::new(RemoteFavorites::new(self.backend.clone(), user_id)))
        } else {
            Ok(Box::new(LocalFavorites::load(self.store.clone()).await))
        }
    }
}
