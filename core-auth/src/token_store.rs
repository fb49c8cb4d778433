//! Token File Persistence
//!
//! Stores the OAuth token on local disk in Google's "authorized user" JSON
//! layout, so the file is interchangeable with Google's own client libraries:
//!
//! ```json
//! {
//!   "token": "ya29...",
//!   "refresh_token": "1//0g...",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "client_id": "123.apps.googleusercontent.com",
//!   "client_secret": "GOCSPX-...",
//!   "scopes": ["https://www.googleapis.com/auth/drive.readonly"],
//!   "expiry": "2024-05-01T10:00:00.000000Z"
//! }
//! ```
//!
//! Writes go to a sibling `*.tmp` file that is then renamed over the target.
//! Token values are never logged.

use crate::error::{AuthError, Result};
use crate::types::{ClientSecrets, OAuthTokens};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File-backed token storage
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

/// On-disk layout of the token file
#[derive(Serialize, Deserialize)]
struct AuthorizedUserFile {
    token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<String>,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token
    ///
    /// Returns:
    /// - `Ok(Some(tokens))` if the file exists and parses
    /// - `Ok(None)` if there is no token file
    /// - `Err(AuthError::TokenCorrupted)` if the file cannot be parsed
    ///
    /// A token file without `expiry` loads as already expired, so it is
    /// refreshed before first use.
    pub async fn load(&self) -> Result<Option<OAuthTokens>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No token file found");
                return Ok(None);
            }
            Err(e) => {
                return Err(AuthError::TokenCorrupted {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let stored: AuthorizedUserFile =
            serde_json::from_slice(&data).map_err(|e| {
                warn!(path = %self.path.display(), error = %e, "Token file is not valid JSON");
                AuthError::TokenCorrupted {
                    path: self.path.clone(),
                    reason: e.to_string(),
                }
            })?;

        let expires_at = match stored.expiry.as_deref() {
            Some(raw) => parse_expiry(raw).ok_or_else(|| AuthError::TokenCorrupted {
                path: self.path.clone(),
                reason: format!("unparseable expiry '{}'", raw),
            })?,
            None => Utc::now(),
        };

        let tokens = OAuthTokens {
            access_token: stored.token,
            refresh_token: stored.refresh_token,
            expires_at,
            scopes: stored.scopes,
        };

        info!(
            has_refresh_token = tokens.refresh_token.is_some(),
            expires_at = %tokens.expires_at,
            "Loaded stored token"
        );

        Ok(Some(tokens))
    }

    /// Persist `tokens` together with the client identity that issued them
    pub async fn save(&self, tokens: &OAuthTokens, secrets: &ClientSecrets) -> Result<()> {
        let stored = AuthorizedUserFile {
            token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            token_uri: Some(secrets.token_uri.clone()),
            client_id: Some(secrets.client_id.clone()),
            client_secret: secrets.client_secret.clone(),
            scopes: tokens.scopes.clone(),
            expiry: Some(
                tokens
                    .expires_at
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ),
        };

        let json = serde_json::to_vec_pretty(&stored)
            .map_err(|e| AuthError::TokenPersistFailed(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::TokenPersistFailed(e.to_string()))?;
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(|e| AuthError::TokenPersistFailed(e.to_string()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| AuthError::TokenPersistFailed(e.to_string()))?;

        info!(path = %self.path.display(), "Token saved");
        Ok(())
    }

    /// Remove the token file; missing files are fine
    pub async fn delete(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::TokenPersistFailed(e.to_string())),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// RFC 3339, or the naive ISO form some writers emit without an offset
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
