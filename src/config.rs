/*
 * Responsibility
 * - Demo server settings from the environment (.env is loaded if present)
 * - CSRF options (CSRF_*) are validated here; a bad value fails startup
 */
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::services::csrf::{CsrfConfig, CsrfConfigError, store::cookie::DEFAULT_COOKIE_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Where the demo server keeps the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Cookie,
    Session,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cookie" => Ok(Self::Cookie),
            "session" => Ok(Self::Session),
            _ => Err(ConfigError::Invalid("CSRF_STORE")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),

    #[error(transparent)]
    Csrf(#[from] CsrfConfigError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,

    pub store: StoreKind,
    pub cookie_name: String,
    pub csrf: CsrfConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            app_env: AppEnv::Development,
            request_timeout_secs: 30,
            body_limit_bytes: 1024 * 1024,
            store: StoreKind::Cookie,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            csrf: CsrfConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let port = parse_or("PORT", std::env::var("PORT").ok(), defaults.addr.port())?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::from_env();

        let request_timeout_secs = parse_or(
            "REQUEST_TIMEOUT_SECS",
            std::env::var("REQUEST_TIMEOUT_SECS").ok(),
            defaults.request_timeout_secs,
        )?;

        let body_limit_bytes = parse_or(
            "BODY_LIMIT_BYTES",
            std::env::var("BODY_LIMIT_BYTES").ok(),
            defaults.body_limit_bytes,
        )?;

        let store = match std::env::var("CSRF_STORE") {
            Ok(v) => v.parse()?,
            Err(_) => StoreKind::Cookie,
        };

        let cookie_name = std::env::var("CSRF_COOKIE_NAME")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());

        let csrf = csrf_from_vars(|key| std::env::var(key).ok())?;

        Ok(Self {
            addr,
            app_env,
            request_timeout_secs,
            body_limit_bytes,
            store,
            cookie_name,
            csrf,
        })
    }
}

/// Unset keeps `default`; a value that does not parse is an error.
fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

/// `CSRF_EXCLUDED_METHODS` set to an empty string means "no exemptions";
/// unset keeps the defaults.
fn csrf_from_vars(var: impl Fn(&'static str) -> Option<String>) -> Result<CsrfConfig, ConfigError> {
    let mut builder = CsrfConfig::builder();

    if let Some(message) = var("CSRF_INVALID_TOKEN_MESSAGE") {
        builder = builder.invalid_token_message(message);
    }

    if let Some(status) = var("CSRF_INVALID_TOKEN_STATUS") {
        let status = status
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid("CSRF_INVALID_TOKEN_STATUS"))?;
        builder = builder.invalid_token_status(status);
    }

    if let Some(methods) = var("CSRF_EXCLUDED_METHODS") {
        builder = builder.excluded_methods(
            methods
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        );
    }

    if let Some(field) = var("CSRF_HEADER_FIELD") {
        builder = builder.header_field(field.trim());
    }

    Ok(builder.build()?)
}
