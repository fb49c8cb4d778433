//! Authorization Abstractions
//!
//! OAuth consent needs a human: the authorization URL is shown to the user and
//! the provider redirects back with a code. How that redirect is received is
//! host-specific (loopback server on desktop, pasted code in a terminal, a
//! pre-seeded answer in tests).
//!
//! Once authorized, API clients only need a bearer token; they obtain it
//! through [`AccessTokenProvider`] so that long runs can refresh it.

use async_trait::async_trait;

use crate::error::Result;

/// Query parameters delivered to the redirect URI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationResponse {
    /// Authorization code, present when the user granted access
    pub code: Option<String>,
    /// Echoed `state` parameter
    pub state: Option<String>,
    /// OAuth error code (e.g. `access_denied`)
    pub error: Option<String>,
}

impl AuthorizationResponse {
    /// Parse the query string of a redirect (`code=...&state=...`)
    pub fn from_query(query: &str) -> Self {
        let mut response = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" => response.code = Some(value.into_owned()),
                "state" => response.state = Some(value.into_owned()),
                "error" => response.error = Some(value.into_owned()),
                _ => {}
            }
        }
        response
    }
}

/// Interactive consent capability
///
/// # Example
///
/// ```ignore
/// let redirect_uri = prompt.redirect_uri();
/// let auth_url = build_url_with(redirect_uri);
/// let response = prompt.authorize(&auth_url).await?;
/// ```
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Redirect URI to register in the authorization request
    fn redirect_uri(&self) -> String;

    /// Present `auth_url` to the user and wait for the redirect
    async fn authorize(&self, auth_url: &str) -> Result<AuthorizationResponse>;
}

/// Source of bearer tokens for API requests
///
/// Implementations return a token that is valid for at least the next request,
/// refreshing it when needed.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed bearer token, for tests and short-lived tools
#[derive(Clone)]
pub struct StaticAccessToken(String);

impl StaticAccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticAccessToken([REDACTED])")
    }
}

#[async_trait]
impl AccessTokenProvider for StaticAccessToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
