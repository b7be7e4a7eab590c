//! Session-backed token store (the default).
//!
//! Requires `tower_sessions::SessionManagerLayer` outside the CSRF layer so a
//! `Session` is present in request extensions. Persisting the session is the
//! session layer's job.
use async_trait::async_trait;
use tower_sessions::Session;

use crate::services::csrf::store::{StoreError, TokenContext, TokenStore};
use crate::services::csrf::tokens::CsrfToken;

pub const DEFAULT_SESSION_KEY: &str = "csrf_token";

#[derive(Clone, Debug)]
pub struct SessionTokenStore {
    key: String,
}

impl Default for SessionTokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_KEY)
    }
}

impl SessionTokenStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn session(ctx: &TokenContext<'_>) -> Result<Session, StoreError> {
        ctx.extensions()
            .get::<Session>()
            .cloned()
            .ok_or(StoreError::MissingSession)
    }
}

#[async_trait]
impl TokenStore for SessionTokenStore {
    fn backend_name(&self) -> &'static str {
        "session"
    }

    async fn read(&self, ctx: &TokenContext<'_>) -> Result<Option<CsrfToken>, StoreError> {
        let session = Self::session(ctx)?;
        Ok(session.get::<CsrfToken>(&self.key).await?)
    }

    async fn write(
        &self,
        ctx: &mut TokenContext<'_>,
        token: &CsrfToken,
    ) -> Result<(), StoreError> {
        let session = Self::session(ctx)?;
        session.insert(&self.key, token).await?;
        Ok(())
    }
}
