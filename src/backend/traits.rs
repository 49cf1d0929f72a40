use crate::backend::Query;
use crate::error::Result;
use crate::models::Session;
use async_trait::async_trait;
use serde_json::Value;

/// Common trait for the hosted backend-as-a-service surface
/// Covers table CRUD, object storage and authentication
#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows matching every filter of the query
    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Apply `changes` to every matching row and return the updated rows
    async fn update(&self, query: &Query, changes: Value) -> Result<Vec<Value>>;

    async fn delete(&self, query: &Query) -> Result<()>;

    /// Store an object, replacing any existing object at the same path
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;

    /// Use this session's token for subsequent requests
    async fn set_session(&self, session: Option<Session>);

    fn source_name(&self) -> &'static str;
}
