use bridge_traits::error::BridgeError;
use std::path::PathBuf;
use thiserror::Error;

/// Authentication failures
///
/// Every variant is fatal for a run: without credentials nothing can be listed
/// or uploaded.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Client secrets file not found: {}", .0.display())]
    CredentialsMissing(PathBuf),

    #[error("Client secrets are invalid: {0}")]
    CredentialsInvalid(String),

    #[error("Authorization was denied: {0}")]
    ConsentDenied(String),

    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch { expected: String, actual: String },

    #[error("Authorization code rejected: {0}")]
    InvalidAuthCode(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Token file {} is corrupted: {reason}", path.display())]
    TokenCorrupted { path: PathBuf, reason: String },

    #[error("Failed to persist token: {0}")]
    TokenPersistFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("{0}")]
    Other(String),
}

impl From<AuthError> for BridgeError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NetworkError(msg) => BridgeError::NotAvailable(msg),
            other => BridgeError::Unauthorized(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
