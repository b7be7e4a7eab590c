//! Secret / token generation.
//!
//! The middleware only needs two capabilities from a token service: mint a
//! fresh secret, and derive a token from it. `verify` is exposed for callers
//! that keep the secret server-side and want to check tokens against it.
//!
//! Token format (default `Tokens`):
//!   `<salt>-<b64url(sha256(<salt>-<secret>))>`
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use thiserror::Error;

const DEFAULT_SECRET_LENGTH: usize = 18;
const DEFAULT_SALT_LENGTH: usize = 8;

const SALT_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("random number generator failure: {0}")]
    Rng(getrandom::Error),

    #[error("{field} must be greater than zero")]
    InvalidLength { field: &'static str },
}

/// Anti-forgery token as handed to the client.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CsrfToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for CsrfToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CsrfToken {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Opaque secret a token is derived from. Never leaves the token service.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Secret-backed token service consumed by the CSRF middleware.
#[async_trait]
pub trait TokenGenerator: Send + Sync + 'static {
    /// Mint a new secret.
    async fn secret(&self) -> Result<Secret, TokenError>;

    /// Derive a token from `secret`.
    fn create(&self, secret: &Secret) -> Result<CsrfToken, TokenError>;

    /// Check that `token` was derived from `secret`.
    fn verify(&self, secret: &Secret, token: &str) -> bool;
}

/// Default token service backed by the OS random number generator.
#[derive(Clone, Copy, Debug)]
pub struct Tokens {
    secret_length: usize,
    salt_length: usize,
}

impl Default for Tokens {
    fn default() -> Self {
        Self {
            secret_length: DEFAULT_SECRET_LENGTH,
            salt_length: DEFAULT_SALT_LENGTH,
        }
    }
}

impl Tokens {
    /// `secret_length` is in bytes of entropy, `salt_length` in characters.
    pub fn new(secret_length: usize, salt_length: usize) -> Result<Self, TokenError> {
        if secret_length == 0 {
            return Err(TokenError::InvalidLength {
                field: "secret_length",
            });
        }
        if salt_length == 0 {
            return Err(TokenError::InvalidLength {
                field: "salt_length",
            });
        }

        Ok(Self {
            secret_length,
            salt_length,
        })
    }

    fn salt(&self) -> Result<String, TokenError> {
        // Reject bytes >= 248 so `% 62` stays uniform.
        let limit = (u8::MAX as usize + 1) / SALT_ALPHABET.len() * SALT_ALPHABET.len();

        let mut salt = String::with_capacity(self.salt_length);
        let mut buf = [0u8; 16];
        while salt.len() < self.salt_length {
            getrandom::fill(&mut buf).map_err(TokenError::Rng)?;
            for b in buf {
                if (b as usize) < limit && salt.len() < self.salt_length {
                    salt.push(SALT_ALPHABET[b as usize % SALT_ALPHABET.len()] as char);
                }
            }
        }

        Ok(salt)
    }
}

fn digest(salt: &str, secret: &Secret) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"-");
    hasher.update(secret.expose().as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[async_trait]
impl TokenGenerator for Tokens {
    async fn secret(&self) -> Result<Secret, TokenError> {
        let mut bytes = vec![0u8; self.secret_length];
        getrandom::fill(&mut bytes).map_err(TokenError::Rng)?;

        Ok(Secret(URL_SAFE_NO_PAD.encode(bytes)))
    }

    fn create(&self, secret: &Secret) -> Result<CsrfToken, TokenError> {
        let salt = self.salt()?;
        let hash = digest(&salt, secret);

        Ok(CsrfToken(format!("{salt}-{hash}")))
    }

    fn verify(&self, secret: &Secret, token: &str) -> bool {
        let Some((salt, _)) = token.split_once('-') else {
            return false;
        };

        let expected = format!("{salt}-{}", digest(salt, secret));
        expected.as_bytes().ct_eq(token.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_token_verifies_against_its_secret() {
        let tokens = Tokens::default();
        let secret = tokens.secret().await.unwrap();
        let token = tokens.create(&secret).unwrap();

        assert!(tokens.verify(&secret, token.as_str()));
    }

    #[tokio::test]
    async fn token_from_another_secret_is_rejected() {
        let tokens = Tokens::default();
        let a = tokens.secret().await.unwrap();
        let b = tokens.secret().await.unwrap();
        assert_ne!(a, b);

        let token = tokens.create(&a).unwrap();
        assert!(!tokens.verify(&b, token.as_str()));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let tokens = Tokens::default();
        let secret = tokens.secret().await.unwrap();
        let token = tokens.create(&secret).unwrap().into_inner();

        let mut forged = token.clone();
        let last = forged.pop().unwrap();
        forged.push(if last == 'A' { 'B' } else { 'A' });

        assert!(tokens.verify(&secret, &token));
        assert!(!tokens.verify(&secret, &forged));
        assert!(!tokens.verify(&secret, "no-dash-hash"));
        assert!(!tokens.verify(&secret, "nodash"));
    }

    #[tokio::test]
    async fn lengths_follow_configuration() {
        let tokens = Tokens::new(32, 12).unwrap();
        let secret = tokens.secret().await.unwrap();
        // 32 bytes -> 43 base64url chars without padding
        assert_eq!(secret.expose().len(), 43);

        let token = tokens.create(&secret).unwrap();
        let (salt, hash) = token.as_str().split_once('-').unwrap();
        assert_eq!(salt.len(), 12);
        assert!(salt.bytes().all(|b| b.is_ascii_alphanumeric()));
        // sha256 -> 43 base64url chars
        assert_eq!(hash.len(), 43);
    }

    #[tokio::test]
    async fn default_secret_is_24_chars() {
        let secret = Tokens::default().secret().await.unwrap();
        assert_eq!(secret.expose().len(), 24);
    }

    #[test]
    fn zero_lengths_are_rejected() {
        assert!(matches!(
            Tokens::new(0, 8),
            Err(TokenError::InvalidLength {
                field: "secret_length"
            })
        ));
        assert!(matches!(
            Tokens::new(18, 0),
            Err(TokenError::InvalidLength {
                field: "salt_length"
            })
        ));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(<redacted>)");
    }
}
