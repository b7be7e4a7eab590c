//! Cookie-backed token store.
//!
//! The token is kept in a cookie that page JavaScript can read (HttpOnly off
//! by default), so it can echo the value back in the request header.
use async_trait::async_trait;
use axum::http::{HeaderValue, header};
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::services::csrf::store::{StoreError, TokenContext, TokenStore};
use crate::services::csrf::tokens::CsrfToken;

pub const DEFAULT_COOKIE_NAME: &str = "csrf-token";

#[derive(Clone, Debug)]
pub struct CookieTokenStore {
    name: String,
    path: String,
    domain: Option<String>,
    http_only: bool,
    secure: bool,
    same_site: Option<SameSite>,
}

impl Default for CookieTokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME)
    }
}

impl CookieTokenStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: "/".to_string(),
            domain: None,
            http_only: false,
            secure: false,
            same_site: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Only useful when the page gets the token some other way (e.g. a
    /// rendered template); header echo from JavaScript needs it off.
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    fn build_cookie(&self, token: &CsrfToken) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), token.as_str().to_owned()))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }

        builder.build()
    }
}

#[async_trait]
impl TokenStore for CookieTokenStore {
    fn backend_name(&self) -> &'static str {
        "cookie"
    }

    /// First match wins when the name repeats: browsers send the most
    /// specific path first.
    async fn read(&self, ctx: &TokenContext<'_>) -> Result<Option<CsrfToken>, StoreError> {
        let token = ctx
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.name)
            .map(|cookie| CsrfToken::from(cookie.value()));

        Ok(token)
    }

    async fn write(
        &self,
        ctx: &mut TokenContext<'_>,
        token: &CsrfToken,
    ) -> Result<(), StoreError> {
        let cookie = self.build_cookie(token);
        let value = HeaderValue::from_str(&cookie.to_string())?;

        ctx.append_response_header(header::SET_COOKIE, value);
        Ok(())
    }
}
