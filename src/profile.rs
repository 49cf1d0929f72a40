use crate::backend::{
    content_type_for, decode_rows, Backend, Query, PROFILE_PICTURES_BUCKET, USERS_TABLE,
};
use crate::error::{Error, Result};
use crate::models::{ProfileUpdate, UserProfile};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Reads and writes rows of the hosted `users` table
pub struct ProfileService {
    backend: Arc<dyn Backend>,
}

impl ProfileService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn get(&self, user_id: &str) -> Result<UserProfile> {
        let rows = self
            .backend
            .select(&Query::table(USERS_TABLE).eq("id", user_id))
            .await?;
        decode_rows::<UserProfile>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                entity: "Profile",
                id: user_id.to_string(),
            })
    }

    pub async fn update(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserProfile> {
        let changes = serde_json::to_value(update)?;
        let rows = self
            .backend
            .update(&Query::table(USERS_TABLE).eq("id", user_id), changes)
            .await?;
        decode_rows::<UserProfile>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                entity: "Profile",
                id: user_id.to_string(),
            })
    }

    /// Upload a new avatar and point the profile at its public URL
    pub async fn upload_avatar(
        &self,
        user_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let path = format!("{}/{}_{}", user_id, Utc::now().timestamp_millis(), file_name);
        self.backend
            .upload(
                PROFILE_PICTURES_BUCKET,
                &path,
                bytes,
                content_type_for(file_name),
            )
            .await?;

        let url = self.backend.public_url(PROFILE_PICTURES_BUCKET, &path);
        self.update(
            user_id,
            &ProfileUpdate {
                profile_image: Some(url.clone()),
                ..Default::default()
            },
        )
        .await?;
        info!("Updated avatar for {}", user_id);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::Preferences;
    use assert_matches::assert_matches;
    use serde_json::json;

    async fn seeded() -> ProfileService {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
        backend
            .insert(
                USERS_TABLE,
                json!({ "id": "u1", "email": "sam@uni.edu", "name": "Sam" }),
            )
            .await
            .unwrap();
        ProfileService::new(backend)
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let service = seeded().await;
        assert_matches!(service.get("ghost").await, Err(Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_keeps_untouched_fields() {
        let service = seeded().await;
        let prefs = Preferences {
            max_rent: Some(900.0),
            roommates: Some(true),
            ..Default::default()
        };

        let updated = service
            .update(
                "u1",
                &ProfileUpdate {
                    preferences: Some(prefs.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Sam");
        assert_eq!(updated.preferences, prefs);
    }

    #[tokio::test]
    async fn avatar_upload_sets_profile_image() {
        let service = seeded().await;
        let url = service
            .upload_avatar("u1", "me.jpg", vec![0xff, 0xd8])
            .await
            .unwrap();

        assert!(url.starts_with("memory://profile-pictures/u1/"));
        assert!(url.ends_with("_me.jpg"));
        assert_eq!(service.get("u1").await.unwrap().profile_image, url);
    }
}
