/*
 * Responsibility
 * - GET /token: echo the current CSRF token so a client can copy it into
 *   the request header (the cookie store also exposes it via Set-Cookie)
 */
use axum::Extension;

use crate::services::csrf::CsrfToken;

pub async fn token(Extension(token): Extension<CsrfToken>) -> String {
    token.into_inner()
}
