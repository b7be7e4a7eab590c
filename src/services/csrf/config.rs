//! Middleware options, resolved once when the middleware is built.
//!
//! Unset (or falsy) values fall back to their defaults, so an empty message
//! or a `0` status behave as if they were never given. An explicitly empty
//! `excluded_methods` list is kept as-is: every method is then validated.
use axum::http::{HeaderName, StatusCode};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_INVALID_TOKEN_MESSAGE: &str = "Invalid CSRF Token";
pub const DEFAULT_INVALID_TOKEN_STATUS: StatusCode = StatusCode::FORBIDDEN;
pub const DEFAULT_HEADER_FIELD: &str = "X-CSRF-Token";
pub const DEFAULT_EXCLUDED_METHODS: [&str; 3] = ["GET", "HEAD", "OPTIONS"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsrfConfigError {
    #[error("invalid header field: {0:?}")]
    InvalidHeaderField(String),

    #[error("invalid token status code: {0} (expected 4xx or 5xx)")]
    InvalidStatus(u16),
}

#[derive(Clone, Debug)]
pub struct CsrfConfig {
    invalid_token_message: String,
    invalid_token_status: StatusCode,
    excluded_methods: Vec<String>,
    header_field: HeaderName,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            invalid_token_message: DEFAULT_INVALID_TOKEN_MESSAGE.to_string(),
            invalid_token_status: DEFAULT_INVALID_TOKEN_STATUS,
            excluded_methods: DEFAULT_EXCLUDED_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            header_field: HeaderName::from_static("x-csrf-token"),
        }
    }
}

impl CsrfConfig {
    pub fn builder() -> CsrfConfigBuilder {
        CsrfConfigBuilder::default()
    }

    pub fn invalid_token_message(&self) -> &str {
        &self.invalid_token_message
    }

    pub fn invalid_token_status(&self) -> StatusCode {
        self.invalid_token_status
    }

    pub fn excluded_methods(&self) -> &[String] {
        &self.excluded_methods
    }

    pub fn header_field(&self) -> &HeaderName {
        &self.header_field
    }

    /// Case-sensitive: `"get"` does not exempt `GET`.
    pub fn is_excluded(&self, method: &str) -> bool {
        self.excluded_methods.iter().any(|m| m == method)
    }
}

/// Raw options, as written by hand or read from a config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsrfConfigBuilder {
    invalid_token_message: Option<String>,
    invalid_token_status: Option<u16>,
    excluded_methods: Option<Vec<String>>,
    header_field: Option<String>,
}

impl CsrfConfigBuilder {
    pub fn invalid_token_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_token_message = Some(message.into());
        self
    }

    pub fn invalid_token_status(mut self, status: u16) -> Self {
        self.invalid_token_status = Some(status);
        self
    }

    pub fn excluded_methods<I, M>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.excluded_methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn header_field(mut self, field: impl Into<String>) -> Self {
        self.header_field = Some(field.into());
        self
    }

    pub fn build(self) -> Result<CsrfConfig, CsrfConfigError> {
        let defaults = CsrfConfig::default();

        let invalid_token_message = self
            .invalid_token_message
            .filter(|m| !m.is_empty())
            .unwrap_or(defaults.invalid_token_message);

        let invalid_token_status = match self.invalid_token_status {
            None | Some(0) => defaults.invalid_token_status,
            Some(code) => StatusCode::from_u16(code)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .ok_or(CsrfConfigError::InvalidStatus(code))?,
        };

        let excluded_methods = self
            .excluded_methods
            .unwrap_or(defaults.excluded_methods);

        let header_field = match self.header_field.filter(|f| !f.is_empty()) {
            None => defaults.header_field,
            Some(field) => HeaderName::try_from(field.as_str())
                .map_err(|_| CsrfConfigError::InvalidHeaderField(field.clone()))?,
        };

        Ok(CsrfConfig {
            invalid_token_message,
            invalid_token_status,
            excluded_methods,
            header_field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CsrfConfig::default();

        assert_eq!(config.invalid_token_message(), "Invalid CSRF Token");
        assert_eq!(config.invalid_token_status(), StatusCode::FORBIDDEN);
        assert_eq!(config.excluded_methods(), ["GET", "HEAD", "OPTIONS"]);
        assert_eq!(config.header_field().as_str(), "x-csrf-token");
        assert_eq!(
            config.header_field(),
            &HeaderName::from_static("x-csrf-token")
        );
    }

    #[test]
    fn empty_builder_matches_defaults() {
        let config = CsrfConfig::builder().build().unwrap();
        let defaults = CsrfConfig::default();

        assert_eq!(
            config.invalid_token_message(),
            defaults.invalid_token_message()
        );
        assert_eq!(config.excluded_methods(), defaults.excluded_methods());
    }

    #[test]
    fn falsy_values_fall_back_to_defaults() {
        let config = CsrfConfig::builder()
            .invalid_token_message("")
            .invalid_token_status(0)
            .header_field("")
            .build()
            .unwrap();

        assert_eq!(config.invalid_token_message(), DEFAULT_INVALID_TOKEN_MESSAGE);
        assert_eq!(config.invalid_token_status(), StatusCode::FORBIDDEN);
        assert_eq!(config.header_field().as_str(), "x-csrf-token");
    }

    #[test]
    fn explicit_empty_exclusions_are_kept() {
        let config = CsrfConfig::builder()
            .excluded_methods(Vec::<String>::new())
            .build()
            .unwrap();

        assert!(config.excluded_methods().is_empty());
        assert!(!config.is_excluded("GET"));
    }

    #[test]
    fn method_match_is_case_sensitive() {
        let config = CsrfConfig::builder()
            .excluded_methods(["get", "POST"])
            .build()
            .unwrap();

        assert!(!config.is_excluded("GET"));
        assert!(config.is_excluded("POST"));
    }

    #[test]
    fn overrides() {
        let config = CsrfConfig::builder()
            .invalid_token_message("nope")
            .invalid_token_status(419)
            .header_field("X-XSRF-Token")
            .build()
            .unwrap();

        assert_eq!(config.invalid_token_message(), "nope");
        assert_eq!(config.invalid_token_status().as_u16(), 419);
        assert_eq!(config.header_field().as_str(), "x-xsrf-token");
    }

    #[test]
    fn rejects_bad_header_field() {
        let err = CsrfConfig::builder()
            .header_field("X CSRF")
            .build()
            .unwrap_err();

        assert_eq!(err, CsrfConfigError::InvalidHeaderField("X CSRF".into()));
    }

    #[test]
    fn rejects_non_error_status() {
        assert_eq!(
            CsrfConfig::builder()
                .invalid_token_status(200)
                .build()
                .unwrap_err(),
            CsrfConfigError::InvalidStatus(200)
        );
        assert_eq!(
            CsrfConfig::builder()
                .invalid_token_status(1000)
                .build()
                .unwrap_err(),
            CsrfConfigError::InvalidStatus(1000)
        );
    }

    #[test]
    fn deserializes_from_json() {
        let builder: CsrfConfigBuilder = serde_json::from_str(
            r#"{"excluded_methods": [], "invalid_token_status": 401}"#,
        )
        .unwrap();
        let config = builder.build().unwrap();

        assert!(config.excluded_methods().is_empty());
        assert_eq!(config.invalid_token_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(config.invalid_token_message(), DEFAULT_INVALID_TOKEN_MESSAGE);
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let res = serde_json::from_str::<CsrfConfigBuilder>(r#"{"header": "X-Token"}"#);
        assert!(res.is_err());
    }
}
