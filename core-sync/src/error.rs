use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use core_metadata::MetadataError;
use provider_google_drive::GoogleDriveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("No folder named '{name}' found at the top of My Drive")]
    RootFolderNotFound { name: String },

    #[error("{count} folders named '{name}' found at the top of My Drive; rename one")]
    RootFolderAmbiguous { name: String, count: usize },

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Whether the run must stop instead of recording a per-file failure
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Auth(_)
                | SyncError::RootFolderNotFound { .. }
                | SyncError::RootFolderAmbiguous { .. }
                | SyncError::Config(_)
        )
    }
}

impl From<GoogleDriveError> for SyncError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::RootFolderNotFound { name } => SyncError::RootFolderNotFound { name },
            GoogleDriveError::RootFolderAmbiguous { name, count } => {
                SyncError::RootFolderAmbiguous { name, count }
            }
            GoogleDriveError::BridgeError(e) => e.into(),
            other => SyncError::Provider(other.to_string()),
        }
    }
}

impl From<BridgeError> for SyncError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Io(e) => SyncError::Io(e),
            BridgeError::Unauthorized(msg) => SyncError::Auth(AuthError::Other(msg)),
            other => SyncError::Provider(other.to_string()),
        }
    }
}

impl From<MetadataError> for SyncError {
    fn from(error: MetadataError) -> Self {
        match error {
            MetadataError::Io(e) => SyncError::Io(e),
            other => SyncError::Provider(other.to_string()),
        }
    }
}

impl From<core_runtime::Error> for SyncError {
    fn from(error: core_runtime::Error) -> Self {
        SyncError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_errors_map_from_drive() {
        let error: SyncError = GoogleDriveError::RootFolderNotFound {
            name: "Trip2023".to_string(),
        }
        .into();
        assert!(matches!(error, SyncError::RootFolderNotFound { ref name } if name == "Trip2023"));
        assert!(error.is_fatal());

        let error: SyncError = GoogleDriveError::RootFolderAmbiguous {
            name: "Trip2023".to_string(),
            count: 3,
        }
        .into();
        assert!(matches!(error, SyncError::RootFolderAmbiguous { count: 3, .. }));
    }

    #[test]
    fn test_transfer_errors_are_recoverable() {
        let error: SyncError = BridgeError::OperationFailed("HTTP 500".to_string()).into();
        assert!(matches!(error, SyncError::Provider(_)));
        assert!(!error.is_fatal());

        let error: SyncError =
            GoogleDriveError::BridgeError(BridgeError::Io(std::io::Error::other("disk full")))
                .into();
        assert!(matches!(error, SyncError::Io(_)));
        assert!(!error.is_fatal());

        let error: SyncError = AuthError::ConsentDenied("access_denied".to_string()).into();
        assert!(error.is_fatal());
    }

    #[test]
    fn test_unauthorized_bridge_error_is_fatal() {
        let error: SyncError = BridgeError::Unauthorized("Token refresh failed: invalid_grant".into()).into();
        assert!(matches!(error, SyncError::Auth(_)));
        assert!(error.is_fatal());

        let error: SyncError =
            GoogleDriveError::BridgeError(BridgeError::Unauthorized("revoked".into())).into();
        assert!(error.is_fatal());
    }
}
