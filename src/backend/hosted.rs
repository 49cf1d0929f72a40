use crate::backend::traits::Backend;
use crate::backend::Query;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::Session;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("letmeknock/", env!("CARGO_PKG_VERSION"));

/// REST client for the hosted backend (tables, storage, auth)
pub struct HostedBackend {
    client: Client,
    base_url: String,
    base: Url,
    anon_key: String,
    session: RwLock<Option<Session>>,
}

impl HostedBackend {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let base_url = base_url.trim_end_matches('/');
        let base = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| Error::Validation(format!("invalid backend URL: {base_url}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            base,
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
        })
    }

    /// Build a client from configuration; `None` when the backend is not configured
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        match (&config.backend_url, &config.anon_key) {
            (Some(url), Some(key)) => {
                info!("Using hosted backend at {}", url);
                Ok(Some(Self::new(url, key, config.request_timeout)?))
            }
            _ => Ok(None),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Object URL with every path segment percent-encoded
    fn object_url(&self, prefix: &[&str], path: &str) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(prefix)
                .extend(path.split('/'));
        }
        url.to_string()
    }

    fn storage_url(&self, bucket: &str, path: &str) -> String {
        self.object_url(&["storage", "v1", "object", bucket], path)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, endpoint)
    }

    async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        }
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.authorized(builder).await.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        warn!("Backend returned status {}: {}", status, message);
        Err(Error::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json(&self, builder: RequestBuilder) -> Result<Value> {
        let response = self.send(builder).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn session_from(&self, body: Value) -> Result<Session> {
        if body.get("access_token").is_none() {
            return Err(Error::Unauthorized(
                "Check your email to confirm your account, then sign in".to_string(),
            ));
        }
        let session: Session = serde_json::from_value(body)?;
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }
}

/// Query-string pairs for a table query, in the hosted REST dialect
pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = query
        .filters
        .iter()
        .map(|(column, value)| (column.clone(), format!("eq.{value}")))
        .collect();

    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }

    params
}

/// Pull the human-readable message out of an error body
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn first_row(value: Value) -> Result<Value> {
    match value {
        Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
        Value::Object(_) => Ok(value),
        other => Err(Error::Decode(format!("expected a row, got {other}"))),
    }
}

fn rows(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::Decode(format!("expected rows, got {other}"))),
    }
}

#[async_trait]
impl Backend for HostedBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        debug!("Selecting from {} with {:?}", query.table, query.filters);
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query_params(query));

        let request = self.client.get(self.rest_url(&query.table)).query(&params);
        rows(self.send_json(request).await?)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        debug!("Inserting into {}", table);
        let request = self
            .client
            .post(self.rest_url(table))
            .header("Prefer", "return=representation")
            .json(&json!([row]));

        first_row(self.send_json(request).await?)
    }

    async fn update(&self, query: &Query, changes: Value) -> Result<Vec<Value>> {
        debug!("Updating {} where {:?}", query.table, query.filters);
        let request = self
            .client
            .patch(self.rest_url(&query.table))
            .query(&query_params(query))
            .header("Prefer", "return=representation")
            .json(&changes);

        rows(self.send_json(request).await?)
    }

    async fn delete(&self, query: &Query) -> Result<()> {
        debug!("Deleting from {} where {:?}", query.table, query.filters);
        let request = self
            .client
            .delete(self.rest_url(&query.table))
            .query(&query_params(query));

        self.send(request).await?;
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        debug!("Uploading {} bytes to {}/{}", bytes.len(), bucket, path);
        let request = self
            .client
            .post(self.storage_url(bucket, path))
            .header("Content-Type", content_type)
            .header("Cache-Control", "max-age=3600")
            .header("x-upsert", "true")
            .body(bytes);

        self.send(request).await?;
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.object_url(&["storage", "v1", "object", "public", bucket], path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        let request = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, bucket))
            .json(&json!({ "prefixes": paths }));

        self.send(request).await?;
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let request = self
            .client
            .post(self.auth_url("signup"))
            .json(&json!({ "email": email, "password": password }));

        let body = self.send_json(request).await?;
        self.session_from(body).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let body = self.send_json(request).await?;
        self.session_from(body).await
    }

    async fn sign_out(&self) -> Result<()> {
        if self.session.read().await.is_none() {
            return Ok(());
        }
        let request = self.client.post(self.auth_url("logout"));
        self.send(request).await?;
        *self.session.write().await = None;
        Ok(())
    }

    async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    fn source_name(&self) -> &'static str {
        "hosted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn filters_and_order_use_rest_dialect() {
        let query = Query::table("favorites")
            .eq("userId", "u1")
            .eq("listingId", "42")
            .order("createdAt", false);

        assert_eq!(
            query_params(&query),
            vec![
                ("userId".to_string(), "eq.u1".to_string()),
                ("listingId".to_string(), "eq.42".to_string()),
                ("order".to_string(), "createdAt.desc".to_string()),
            ]
        );
    }

    #[test]
    fn error_message_prefers_service_text() {
        assert_eq!(
            error_message(r#"{"code":"23505","message":"duplicate key"}"#),
            Some("duplicate key".to_string())
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            Some("Invalid login credentials".to_string())
        );
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn public_url_points_at_public_objects() {
        let backend =
            HostedBackend::new("https://example.test/", "anon", Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.public_url("listings", "u1/a.png"),
            "https://example.test/storage/v1/object/public/listings/u1/a.png"
        );
    }

    #[test]
    fn object_paths_are_percent_encoded() {
        let backend =
            HostedBackend::new("https://example.test", "anon", Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.storage_url("profile-pictures", "u1/17_my #1?.png"),
            "https://example.test/storage/v1/object/profile-pictures/u1/17_my%20%231%3F.png"
        );
        assert_eq!(
            backend.public_url("profile-pictures", "u1/17_a#b.png"),
            "https://example.test/storage/v1/object/public/profile-pictures/u1/17_a%23b.png"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HostedBackend::new("not a url", "anon", Duration::from_secs(5)),
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn sign_up_without_token_keeps_anon_session() {
        let backend =
            HostedBackend::new("https://example.test", "anon", Duration::from_secs(5)).unwrap();

        let result = backend
            .session_from(json!({ "id": "u1", "email": "kim@uni.edu" }))
            .await;
        assert_matches!(result, Err(Error::Unauthorized(msg)) if msg.starts_with("Check your email"));
        assert_eq!(backend.bearer().await, "anon");
    }

    #[tokio::test]
    async fn token_response_becomes_the_session() {
        let backend =
            HostedBackend::new("https://example.test", "anon", Duration::from_secs(5)).unwrap();

        let session = backend
            .session_from(json!({
                "access_token": "jwt",
                "refresh_token": "r",
                "user": { "id": "u1", "email": "kim@uni.edu" }
            }))
            .await
            .unwrap();
        assert_eq!(session.user.id, "u1");
        assert_eq!(backend.bearer().await, "jwt");
    }

    #[test]
    fn row_decoding_shapes() {
        assert_matches!(first_row(json!([])), Err(Error::Decode(_)));
        assert_eq!(first_row(json!([{ "id": 1 }, { "id": 2 }])).unwrap(), json!({ "id": 1 }));
        assert_eq!(first_row(json!({ "id": 3 })).unwrap(), json!({ "id": 3 }));

        assert!(rows(Value::Null).unwrap().is_empty());
        assert_eq!(rows(json!([{ "id": 1 }])).unwrap().len(), 1);
        assert_matches!(rows(json!("nope")), Err(Error::Decode(_)));
    }

    #[tokio::test]
    async fn bearer_falls_back_to_anon_key() {
        let backend =
            HostedBackend::new("https://example.test", "anon", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.bearer().await, "anon");
    }
}
