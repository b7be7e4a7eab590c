/*
 * Responsibility
 * - URL layout of the demo server
 * - `/` accepts every method so each one goes through the CSRF check
 */
use axum::{
    Router,
    routing::{any, get},
};

use crate::api::handlers::{health::health, hello::hello, token::token};

pub fn routes() -> Router {
    Router::new()
        .route("/", any(hello))
        .route("/token", get(token))
        .route("/health", get(health))
}
