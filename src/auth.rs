use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::models::Session;
use crate::store::{LocalStore, SESSION_KEY};
use std::sync::Arc;
use tracing::{info, warn};

/// Sign-up form as filled in by a new user
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_terms: bool,
}

/// Sign-in state, persisted on the device between runs
pub struct AuthService {
    backend: Arc<dyn Backend>,
    store: LocalStore,
}

impl AuthService {
    pub fn new(backend: Arc<dyn Backend>, store: LocalStore) -> Self {
        Self { backend, store }
    }

    /// Load a persisted session and hand its token to the backend
    pub async fn restore(&self) -> Option<Session> {
        let session: Option<Session> = self.store.get(SESSION_KEY).await;
        if let Some(session) = &session {
            info!("Restored session for {}", session.user.id);
        }
        self.backend.set_session(session.clone()).await;
        session
    }

    pub async fn current(&self) -> Option<Session> {
        self.store.get(SESSION_KEY).await
    }

    /// The signed-in user's id, or `Unauthorized`
    pub async fn require_user(&self) -> Result<String> {
        self.current()
            .await
            .map(|s| s.user.id)
            .ok_or_else(|| Error::Unauthorized("You must be signed in".to_string()))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.backend.sign_in(email.trim(), password).await?;
        self.persist(&session).await?;
        info!("Signed in as {}", email.trim());
        Ok(session)
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> Result<Session> {
        if form.password != form.confirm_password {
            return Err(Error::Validation("Passwords do not match".to_string()));
        }
        if !form.agree_terms {
            return Err(Error::Validation("You must agree to the terms.".to_string()));
        }

        let session = self.backend.sign_up(form.email.trim(), &form.password).await?;
        self.persist(&session).await?;
        info!("Signed up as {}", form.email.trim());
        Ok(session)
    }

    /// Forget the local session even when the backend call fails
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.backend.sign_out().await;
        if let Err(err) = &result {
            warn!("Sign-out request failed: {}", err);
        }
        self.backend.set_session(None).await;
        self.store.remove(SESSION_KEY).await?;
        result
    }

    async fn persist(&self, session: &Session) -> Result<()> {
        self.backend.set_session(Some(session.clone())).await;
        self.store.set(SESSION_KEY, session).await
    }
}
