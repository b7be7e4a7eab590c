pub mod config;
pub mod store;
pub mod tokens;

pub use config::{CsrfConfig, CsrfConfigBuilder, CsrfConfigError};
pub use store::{
    CookieTokenStore, SessionTokenStore, StoreError, TokenContext, TokenStore,
};
pub use tokens::{CsrfToken, Secret, TokenError, TokenGenerator, Tokens};
