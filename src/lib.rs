//! Double-submit CSRF protection for axum.
//!
//! A token is issued the first time a client shows up without one and stored
//! through a pluggable [`TokenStore`] (cookie, session, or your own). Requests
//! whose method is not exempt must echo that token in a header
//! (`X-CSRF-Token` by default) or they are rejected with `403 Invalid CSRF Token`.
//!
//! ```ignore
//! use csrf_header::{CookieTokenStore, CsrfConfig, CsrfProtection};
//!
//! let csrf = CsrfProtection::new(CsrfConfig::default())
//!     .with_store(CookieTokenStore::default());
//! let app = csrf_header::middleware::csrf::apply(router, csrf);
//! ```
//!
//! The `app`, `api` and `config` modules make up the demo server binary.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;

pub use error::CsrfError;
pub use middleware::csrf::{CsrfProtection, apply};
pub use services::csrf::{
    CookieTokenStore, CsrfConfig, CsrfConfigBuilder, CsrfConfigError, CsrfToken, Secret,
    SessionTokenStore, StoreError, TokenContext, TokenError, TokenGenerator, TokenStore, Tokens,
};
