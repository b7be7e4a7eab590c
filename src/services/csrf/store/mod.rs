//! Token storage interface used by the CSRF middleware.
//!
//! The middleware never touches cookies or sessions itself: it reads the
//! current token through `TokenStore::read` and persists a freshly issued one
//! through `TokenStore::write`. Swapping the backend does not affect
//! validation.
use async_trait::async_trait;
use axum::http::{
    Extensions, HeaderMap, HeaderName, HeaderValue, Method, Uri, header::InvalidHeaderValue,
    request::Parts,
};
use thiserror::Error;

use crate::services::csrf::tokens::CsrfToken;

pub mod cookie;
pub mod session;

pub use cookie::CookieTokenStore;
pub use session::SessionTokenStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no session found in request extensions (is the session layer installed?)")]
    MissingSession,

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
}

/// Per-request view handed to a `TokenStore`.
///
/// Gives read access to the request head, and collects headers that must be
/// added to the response (e.g. `Set-Cookie`).
#[derive(Debug)]
pub struct TokenContext<'a> {
    parts: &'a Parts,
    response_headers: HeaderMap,
}

impl<'a> TokenContext<'a> {
    pub fn new(parts: &'a Parts) -> Self {
        Self {
            parts,
            response_headers: HeaderMap::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Queue a header for the response. Multiple values for the same name
    /// are all kept.
    pub fn append_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.append(name, value);
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn into_response_headers(self) -> HeaderMap {
        self.response_headers
    }
}

/// Where the current token lives.
///
/// `read` must not have side effects. An empty stored value counts as no
/// token; the middleware checks for that, implementations need not.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn read(&self, ctx: &TokenContext<'_>) -> Result<Option<CsrfToken>, StoreError>;

    async fn write(&self, ctx: &mut TokenContext<'_>, token: &CsrfToken)
    -> Result<(), StoreError>;
}
