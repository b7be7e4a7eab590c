//! CSRF protection (double-submit pattern).
//!
//! Per request:
//! 1. read the stored token; if there is none, mint one and persist it
//!    (also on exempt methods, so the first safe request seeds the token)
//! 2. exempt methods go straight through
//! 3. everything else must echo the stored token in the configured header
//!
//! Tokens are never rotated once stored.
//!
//! ```ignore
//! let csrf = CsrfProtection::new(CsrfConfig::default())
//!     .with_store(CookieTokenStore::default());
//! let router = middleware::csrf::apply(router, csrf);
//! ```

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::error::CsrfError;
use crate::services::csrf::{
    CsrfConfig, CsrfToken, SessionTokenStore, TokenContext, TokenGenerator, TokenStore, Tokens,
};

/// A configured CSRF middleware instance. Cheap to clone.
#[derive(Clone)]
pub struct CsrfProtection {
    config: Arc<CsrfConfig>,
    store: Arc<dyn TokenStore>,
    tokens: Arc<dyn TokenGenerator>,
}

impl std::fmt::Debug for CsrfProtection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfProtection")
            .field("config", &self.config)
            .field("store", &self.store.backend_name())
            .finish()
    }
}

impl Default for CsrfProtection {
    fn default() -> Self {
        Self::new(CsrfConfig::default())
    }
}

impl CsrfProtection {
    /// Session-backed storage and the default token service.
    pub fn new(config: CsrfConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(SessionTokenStore::default()),
            tokens: Arc::new(Tokens::default()),
        }
    }

    pub fn with_store(mut self, store: impl TokenStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn with_tokens(mut self, tokens: impl TokenGenerator) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Run the check for one request, calling `next` unless it is rejected.
    pub async fn handle(&self, req: Request, next: Next) -> Result<Response, CsrfError> {
        let (mut parts, body) = req.into_parts();

        let mut ctx = TokenContext::new(&parts);
        let token = match self.store.read(&ctx).await?.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => self.issue(&mut ctx).await?,
        };
        let pending = ctx.into_response_headers();

        let method = parts.method.as_str();
        if !self.config.is_excluded(method) {
            // A repeated header never matches, whatever its values.
            let mut values = parts.headers.get_all(self.config.header_field()).iter();
            let supplied = values.next();
            let repeated = values.next().is_some();

            let valid = !repeated
                && supplied
                    .and_then(|value| value.to_str().ok())
                    .is_some_and(|value| {
                        bool::from(value.as_bytes().ct_eq(token.as_str().as_bytes()))
                    });

            if !valid {
                tracing::warn!(
                    method,
                    path = %parts.uri.path(),
                    header = %self.config.header_field(),
                    header_present = supplied.is_some(),
                    header_repeated = repeated,
                    "rejecting request with invalid csrf token"
                );
                return Err(CsrfError::InvalidToken {
                    status: self.config.invalid_token_status(),
                    message: self.config.invalid_token_message().to_string(),
                });
            }
        } else {
            tracing::debug!(method, "csrf check skipped for excluded method");
        }

        parts.extensions.insert(token);

        let mut response = next.run(Request::from_parts(parts, body)).await;
        let headers = response.headers_mut();
        for (name, value) in pending.iter() {
            headers.append(name.clone(), value.clone());
        }

        Ok(response)
    }

    async fn issue(&self, ctx: &mut TokenContext<'_>) -> Result<CsrfToken, CsrfError> {
        let secret = self.tokens.secret().await?;
        let token = self.tokens.create(&secret)?;
        self.store.write(ctx, &token).await?;

        tracing::debug!(
            store = self.store.backend_name(),
            method = %ctx.method(),
            path = %ctx.uri().path(),
            "issued csrf token"
        );

        Ok(token)
    }
}

/// Protect every route of `router` with `csrf`.
pub fn apply<S>(router: Router<S>, csrf: CsrfProtection) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(csrf, csrf_middleware))
}

async fn csrf_middleware(
    State(csrf): State<CsrfProtection>,
    req: Request,
    next: Next,
) -> Result<Response, CsrfError> {
    csrf.handle(req, next).await
}
