//! Credential acquisition
//!
//! [`CredentialProvider`] yields a usable token set. The production
//! implementation, [`InstalledAppCredentials`], follows the usual installed-app
//! sequence:
//!
//! 1. read the client secrets file
//! 2. reuse the stored token while it is valid
//! 3. refresh it when expired and a refresh token exists
//! 4. otherwise run interactive consent and store the result
//!
//! [`SharedAccessToken`] adapts any provider to the
//! [`AccessTokenProvider`] capability used by the API clients, re-obtaining
//! the token whenever it expires during a long run.

use async_trait::async_trait;
use bridge_traits::consent::{AccessTokenProvider, AuthorizationPrompt};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::HttpClient;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::oauth::{OAuthConfig, OAuthFlowManager};
use crate::token_store::TokenStore;
use crate::types::{ClientSecrets, OAuthTokens, TRANSFER_SCOPES};

/// Source of OAuth credentials
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a token set that is not expired
    async fn obtain(&self) -> Result<OAuthTokens>;
}

/// Installed-app OAuth credentials backed by local files
pub struct InstalledAppCredentials {
    credentials_path: PathBuf,
    token_store: TokenStore,
    http_client: Arc<dyn HttpClient>,
    prompt: Arc<dyn AuthorizationPrompt>,
    scopes: Vec<&'static str>,
}

impl InstalledAppCredentials {
    pub fn new(
        credentials_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
        http_client: Arc<dyn HttpClient>,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_store: TokenStore::new(token_path),
            http_client,
            prompt,
            scopes: TRANSFER_SCOPES.to_vec(),
        }
    }

    /// Override the requested scopes
    pub fn with_scopes(mut self, scopes: &[&'static str]) -> Self {
        self.scopes = scopes.to_vec();
        self
    }

    fn flow_manager(&self, secrets: &ClientSecrets) -> OAuthFlowManager {
        let config = OAuthConfig::from_secrets(secrets, self.prompt.redirect_uri(), &self.scopes);
        OAuthFlowManager::new(config, Arc::clone(&self.http_client))
    }

    async fn load_stored(&self) -> Result<Option<OAuthTokens>> {
        match self.token_store.load().await {
            Ok(tokens) => Ok(tokens),
            Err(AuthError::TokenCorrupted { path, reason }) => {
                warn!(
                    path = %path.display(),
                    reason = %reason,
                    "Discarding unreadable token file, asking for consent again"
                );
                self.token_store.delete().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, secrets))]
    async fn run_consent(&self, secrets: &ClientSecrets) -> Result<OAuthTokens> {
        let manager = self.flow_manager(secrets);
        let (auth_url, verifier) = manager.build_auth_url()?;

        let response = self
            .prompt
            .authorize(&auth_url)
            .await
            .map_err(|e| AuthError::Other(format!("Authorization prompt failed: {}", e)))?;

        if let Some(error) = response.error {
            warn!(error = %error, "User did not grant access");
            return Err(AuthError::ConsentDenied(error));
        }

        let code = response.code.ok_or_else(|| {
            AuthError::InvalidAuthCode("Redirect carried no authorization code".to_string())
        })?;
        let state = response.state.unwrap_or_default();

        let mut tokens = manager.exchange_code(&code, &state, &verifier).await?;
        if tokens.scopes.is_empty() {
            tokens.scopes = self.scopes.iter().map(|s| s.to_string()).collect();
        }

        self.token_store.save(&tokens, secrets).await?;
        Ok(tokens)
    }
}

#[async_trait]
impl CredentialProvider for InstalledAppCredentials {
    #[instrument(skip(self), fields(credentials = %self.credentials_path.display()))]
    async fn obtain(&self) -> Result<OAuthTokens> {
        let secrets = ClientSecrets::from_file(&self.credentials_path).await?;

        if let Some(tokens) = self.load_stored().await? {
            if !tokens.covers_scopes(&self.scopes) {
                info!("Stored token lacks required scopes, asking for consent again");
            } else if !tokens.is_expired() {
                info!("Using stored token");
                return Ok(tokens);
            } else if let Some(refresh_token) = tokens.usable_refresh_token() {
                info!("Stored token expired, refreshing");
                let mut refreshed = self
                    .flow_manager(&secrets)
                    .refresh_access_token(refresh_token)
                    .await?;
                if refreshed.scopes.is_empty() {
                    refreshed.scopes = tokens.scopes.clone();
                }
                self.token_store.save(&refreshed, &secrets).await?;
                return Ok(refreshed);
            } else {
                info!("Stored token expired without refresh token");
            }
        }

        self.run_consent(&secrets).await
    }
}

/// Pre-seeded credentials for tests and automation
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    tokens: OAuthTokens,
}

impl StaticCredentials {
    pub fn new(tokens: OAuthTokens) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn obtain(&self) -> Result<OAuthTokens> {
        Ok(self.tokens.clone())
    }
}

/// Cached access token that re-obtains itself once expired
pub struct SharedAccessToken {
    provider: Arc<dyn CredentialProvider>,
    current: Mutex<Option<OAuthTokens>>,
}

impl SharedAccessToken {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            current: Mutex::new(None),
        }
    }

    /// Start from an already obtained token set
    pub fn with_tokens(provider: Arc<dyn CredentialProvider>, tokens: OAuthTokens) -> Self {
        Self {
            provider,
            current: Mutex::new(Some(tokens)),
        }
    }

    /// Current token set, obtaining a new one when missing or expired
    pub async fn tokens(&self) -> Result<OAuthTokens> {
        let mut current = self.current.lock().await;
        match current.as_ref() {
            Some(tokens) if !tokens.is_expired() => Ok(tokens.clone()),
            _ => {
                let fresh = self.provider.obtain().await?;
                *current = Some(fresh.clone());
                Ok(fresh)
            }
        }
    }
}

#[async_trait]
impl AccessTokenProvider for SharedAccessToken {
    async fn access_token(&self) -> BridgeResult<String> {
        Ok(self.tokens().await?.access_token)
    }
}
