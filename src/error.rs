/*
 * Responsibility
 * - CSRF middleware error definition
 * - IntoResponse: token mismatch -> configured status + plain-text message
 *   store / token service failures -> generic 500
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::csrf::{StoreError, TokenError};

#[derive(Debug, Error)]
pub enum CsrfError {
    #[error("{message}")]
    InvalidToken { status: StatusCode, message: String },

    #[error("token store failure: {0}")]
    Store(#[from] StoreError),

    #[error("token generation failure: {0}")]
    Token(#[from] TokenError),
}

impl CsrfError {
    pub fn status(&self) -> StatusCode {
        match self {
            CsrfError::InvalidToken { status, .. } => *status,
            CsrfError::Store(_) | CsrfError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CsrfError {
    fn into_response(self) -> Response {
        match self {
            CsrfError::InvalidToken { status, message } => (status, message).into_response(),
            other => {
                tracing::error!(error = %other, "csrf middleware failed");
                (other.status(), "Internal Server Error").into_response()
            }
        }
    }
}
