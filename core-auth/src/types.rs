use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::{AuthError, Result};

/// Read-only access to the user's Drive
pub const SCOPE_DRIVE_READONLY: &str = "https://www.googleapis.com/auth/drive.readonly";
/// Upload media and create albums
pub const SCOPE_PHOTOS_APPEND_ONLY: &str = "https://www.googleapis.com/auth/photoslibrary.appendonly";
/// Read albums and media created by this app
pub const SCOPE_PHOTOS_READONLY_APP_CREATED: &str =
    "https://www.googleapis.com/auth/photoslibrary.readonly.appcreateddata";
/// Edit albums and media created by this app
pub const SCOPE_PHOTOS_EDIT_APP_CREATED: &str =
    "https://www.googleapis.com/auth/photoslibrary.edit.appcreateddata";

/// Scopes requested by the transfer tool
pub const TRANSFER_SCOPES: &[&str] = &[
    SCOPE_DRIVE_READONLY,
    SCOPE_PHOTOS_APPEND_ONLY,
    SCOPE_PHOTOS_READONLY_APP_CREATED,
    SCOPE_PHOTOS_EDIT_APP_CREATED,
];

/// Google's authorization endpoint
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google's token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds before expiry at which a token is treated as expired
pub const EXPIRY_SKEW_SECONDS: i64 = 60;

/// OAuth 2.0 token set.
///
/// The `Debug` implementation redacts both tokens.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
///
/// let tokens = OAuthTokens::new("ya29.a0...".to_string(), Some("1//0g...".to_string()), 3600);
/// assert!(!tokens.is_expired());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    pub refresh_token: Option<String>,
    /// When the access token expires (UTC)
    pub expires_at: DateTime<Utc>,
    /// Scopes granted with this token, empty when unknown
    pub scopes: Vec<String>,
}

impl OAuthTokens {
    /// Create a token set expiring `expires_in` seconds from now
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
            scopes: Vec::new(),
        }
    }

    /// Attach the granted scopes
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Expired, or expiring within [`EXPIRY_SKEW_SECONDS`]
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(EXPIRY_SKEW_SECONDS)
    }

    /// Expired, or expiring within `buffer_seconds`
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        Utc::now() >= self.expires_at - Duration::seconds(buffer_seconds)
    }

    /// Refresh token usable without user interaction, if any
    pub fn usable_refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Whether every scope in `required` was granted
    ///
    /// A token with unknown scopes is assumed to cover them.
    pub fn covers_scopes(&self, required: &[&str]) -> bool {
        self.scopes.is_empty()
            || required
                .iter()
                .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }
}

impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// OAuth client registration read from `credentials.json`
///
/// Both the `installed` (desktop app) and `web` layouts of the Google Cloud
/// console download are accepted.
#[derive(Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

impl ClientSecrets {
    /// Parse the JSON downloaded from the Google Cloud console
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| AuthError::CredentialsInvalid(e.to_string()))?;

        let secrets = file.installed.or(file.web).ok_or_else(|| {
            AuthError::CredentialsInvalid(
                "expected an \"installed\" or \"web\" client section".to_string(),
            )
        })?;

        if secrets.client_id.trim().is_empty() {
            return Err(AuthError::CredentialsInvalid(
                "client_id is empty".to_string(),
            ));
        }

        Ok(secrets)
    }

    /// Read and parse a client secrets file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::CredentialsMissing(path.to_path_buf()));
            }
            Err(e) => {
                return Err(AuthError::CredentialsInvalid(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Self::from_json(&json)
    }
}

impl fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_expiry_uses_skew() {
        let fresh = OAuthTokens::new("a".into(), None, 3600);
        assert!(!fresh.is_expired());

        // Inside the 60 second skew window
        let nearly = OAuthTokens::new("a".into(), None, 30);
        assert!(nearly.is_expired());
        assert!(!nearly.is_expired_with_buffer(0));

        let expired = OAuthTokens::new("a".into(), None, -10);
        assert!(expired.is_expired());
    }

    #[test]
    fn test_tokens_debug_is_redacted() {
        let tokens = OAuthTokens::new("ya29.secret".into(), Some("1//refresh".into()), 3600);
        let debug = format!("{:?}", tokens);

        assert!(!debug.contains("ya29.secret"));
        assert!(!debug.contains("1//refresh"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_usable_refresh_token() {
        let tokens = OAuthTokens::new("a".into(), Some("r".into()), 0);
        assert_eq!(tokens.usable_refresh_token(), Some("r"));
        assert_eq!(OAuthTokens::new("a".into(), Some(String::new()), 0).usable_refresh_token(), None);
        assert_eq!(OAuthTokens::new("a".into(), None, 0).usable_refresh_token(), None);
    }

    #[test]
    fn test_covers_scopes() {
        let unknown = OAuthTokens::new("a".into(), None, 3600);
        assert!(unknown.covers_scopes(TRANSFER_SCOPES));

        let drive_only =
            OAuthTokens::new("a".into(), None, 3600).with_scopes([SCOPE_DRIVE_READONLY]);
        assert!(drive_only.covers_scopes(&[SCOPE_DRIVE_READONLY]));
        assert!(!drive_only.covers_scopes(TRANSFER_SCOPES));
    }

    #[test]
    fn test_client_secrets_installed() {
        let json = r#"{"installed":{"client_id":"123.apps.googleusercontent.com",
            "client_secret":"GOCSPX-x","redirect_uris":["http://localhost"]}}"#;
        let secrets = ClientSecrets::from_json(json).unwrap();

        assert_eq!(secrets.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret.as_deref(), Some("GOCSPX-x"));
        assert_eq!(secrets.token_uri, GOOGLE_TOKEN_URL);
        assert!(!format!("{:?}", secrets).contains("GOCSPX-x"));
    }

    #[test]
    fn test_client_secrets_web_layout() {
        let json = r#"{"web":{"client_id":"abc","token_uri":"https://example.test/token"}}"#;
        let secrets = ClientSecrets::from_json(json).unwrap();

        assert_eq!(secrets.client_id, "abc");
        assert_eq!(secrets.client_secret, None);
        assert_eq!(secrets.token_uri, "https://example.test/token");
    }

    #[test]
    fn test_client_secrets_rejects_unknown_layout() {
        let result = ClientSecrets::from_json(r#"{"service_account":{}}"#);
        assert!(matches!(result, Err(AuthError::CredentialsInvalid(_))));

        let result = ClientSecrets::from_json("not json");
        assert!(matches!(result, Err(AuthError::CredentialsInvalid(_))));
    }

    #[tokio::test]
    async fn test_client_secrets_missing_file() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));
        let result = ClientSecrets::from_file(&path).await;
        assert!(matches!(result, Err(AuthError::CredentialsMissing(p)) if p == path));
    }
}
