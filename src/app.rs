/*
 * Responsibility
 * - Config loading -> tracing / panic hook -> Router assembly
 * - CSRF store selection (cookie or session), transport layers
 * - axum::serve()
 */
use std::{panic, process};

use anyhow::Result;
use axum::Router;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, StoreKind};
use crate::middleware::{self, CsrfProtection};
use crate::services::csrf::CookieTokenStore;

fn init_tracing() {
    // RUST_LOG wins, e.g. RUST_LOG=info,csrf_header=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash so it gets noticed. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        env = ?config.app_env,
        addr = %config.addr,
        store = ?config.store,
        header = %config.csrf.header_field(),
        "starting csrf demo server"
    );

    let app = build_router(&config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(config: &Config) -> Router {
    let secure = config.app_env.is_production();
    let csrf = CsrfProtection::new(config.csrf.clone());

    let router = match config.store {
        StoreKind::Cookie => {
            let store = CookieTokenStore::new(config.cookie_name.clone()).secure(secure);
            middleware::csrf::apply(api::routes(), csrf.with_store(store))
        }
        StoreKind::Session => {
            // Session layer goes outside so the CSRF layer finds the Session.
            let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(secure);
            middleware::csrf::apply(api::routes(), csrf).layer(sessions)
        }
    };

    middleware::http::apply(router, config)
}
