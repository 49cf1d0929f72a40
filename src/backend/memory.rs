use crate::backend::traits::Backend;
use crate::backend::{fallback, Query, LISTINGS_TABLE};
use crate::error::{Error, Result};
use crate::models::{AuthUser, Session};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    objects: HashMap<(String, String), Vec<u8>>,
    /// email -> (password, user id)
    accounts: HashMap<String, (String, String)>,
    session: Option<Session>,
}

/// In-process backend with the hosted service's table, storage and auth semantics
///
/// A read-only instance backs the static fallback mode: reads succeed, every
/// mutation and auth call fails with [`Error::NotConfigured`].
pub struct MemoryBackend {
    state: Mutex<State>,
    read_only: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            read_only: false,
        }
    }

    /// Read-only backend serving the built-in listings catalogue
    pub fn fallback() -> Self {
        info!("📋 Serving built-in static listings");
        let rows = fallback::static_listings()
            .iter()
            .filter_map(|listing| serde_json::to_value(listing).ok())
            .collect();

        let mut state = State::default();
        state.tables.insert(LISTINGS_TABLE.to_string(), rows);
        Self {
            state: Mutex::new(state),
            read_only: true,
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            Err(Error::NotConfigured)
        } else {
            Ok(())
        }
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.state.lock().await.session.clone()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &Value, query: &Query) -> bool {
    query
        .filters
        .iter()
        .all(|(column, value)| column_text(row, column).as_deref() == Some(value.as_str()))
}

fn compare_column(a: &Value, b: &Value, column: &str) -> Ordering {
    match (a.get(column), b.get(column)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        _ => column_text(a, column).cmp(&column_text(b, column)),
    }
}

fn merge(row: &mut Value, changes: &Value) {
    if let (Value::Object(target), Value::Object(changes)) = (row, changes) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|row| matches(row, query)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_column(a, b, &order.column);
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        debug!("Selected {} rows from {}", rows.len(), query.table);
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Value> {
        self.ensure_writable()?;
        let Value::Object(fields) = &mut row else {
            return Err(Error::Validation(format!("row for {table} must be an object")));
        };
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));

        let mut state = self.state.lock().await;
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, query: &Query, changes: Value) -> Result<Vec<Value>> {
        self.ensure_writable()?;
        let mut state = self.state.lock().await;
        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(&query.table) {
            for row in rows.iter_mut().filter(|row| matches(row, query)) {
                merge(row, &changes);
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<()> {
        self.ensure_writable()?;
        let mut state = self.state.lock().await;
        if let Some(rows) = state.tables.get_mut(&query.table) {
            rows.retain(|row| !matches(row, query));
        }
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String> {
        self.ensure_writable()?;
        let mut state = self.state.lock().await;
        state
            .objects
            .insert((bucket.to_string(), path.to_string()), bytes);
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        self.ensure_writable()?;
        let mut state = self.state.lock().await;
        for path in paths {
            state.objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        self.ensure_writable()?;
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(email) {
            return Err(Error::Backend {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let user_id = Uuid::new_v4().to_string();
        state
            .accounts
            .insert(email.to_string(), (password.to_string(), user_id.clone()));
        let session = session_for(&user_id, email);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.ensure_writable()?;
        let mut state = self.state.lock().await;
        let user_id = match state.accounts.get(email) {
            Some((stored, user_id)) if stored == password => user_id.clone(),
            _ => {
                return Err(Error::Backend {
                    status: 400,
                    message: "Invalid login credentials".to_string(),
                })
            }
        };

        let session = session_for(&user_id, email);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.ensure_writable()?;
        self.state.lock().await.session = None;
        Ok(())
    }

    async fn set_session(&self, session: Option<Session>) {
        self.state.lock().await.session = session;
    }

    fn source_name(&self) -> &'static str {
        if self.read_only {
            "static"
        } else {
            "memory"
        }
    }
}

fn session_for(user_id: &str, email: &str) -> Session {
    Session {
        access_token: Uuid::new_v4().to_string(),
        refresh_token: None,
        user: AuthUser {
            id: user_id.to_string(),
            email: Some(email.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn select_applies_filters_and_order() {
        let backend = MemoryBackend::new();
        for (user, price) in [("a", 900), ("b", 700), ("a", 500)] {
            backend
                .insert("rows", json!({ "userId": user, "price": price }))
                .await
                .unwrap();
        }

        let rows = backend
            .select(&Query::table("rows").eq("userId", "a").order("price", true))
            .await
            .unwrap();

        let prices: Vec<i64> = rows.iter().map(|r| r["price"].as_i64().unwrap()).collect();
        assert_eq!(prices, vec![500, 900]);
    }

    #[tokio::test]
    async fn update_merges_changes_into_matching_rows() {
        let backend = MemoryBackend::new();
        let row = backend
            .insert("favorites", json!({ "listingId": "1", "note": null }))
            .await
            .unwrap();
        let id = row["id"].as_str().unwrap().to_string();

        let updated = backend
            .update(&Query::table("favorites").eq("id", id), json!({ "note": "call landlord" }))
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["note"], "call landlord");
        assert_eq!(updated[0]["listingId"], "1");
    }

    #[tokio::test]
    async fn fallback_serves_reads_and_rejects_writes() {
        let backend = MemoryBackend::fallback();

        let rows = backend.select(&Query::table(LISTINGS_TABLE)).await.unwrap();
        assert_eq!(rows.len(), fallback::static_listings().len());

        let err = backend.insert(LISTINGS_TABLE, json!({})).await.unwrap_err();
        assert_matches!(err, Error::NotConfigured);
        assert_matches!(backend.sign_in("a@b.c", "pw").await, Err(Error::NotConfigured));
    }

    #[tokio::test]
    async fn sign_in_checks_password() {
        let backend = MemoryBackend::new();
        backend.sign_up("kim@uni.edu", "secret").await.unwrap();

        assert!(backend.sign_in("kim@uni.edu", "secret").await.is_ok());
        assert_matches!(
            backend.sign_in("kim@uni.edu", "wrong").await,
            Err(Error::Backend { status: 400, .. })
        );
    }
}
