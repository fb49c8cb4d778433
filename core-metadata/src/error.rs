use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to probe media: {0}")]
    ProbeFailed(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

impl From<MetadataError> for bridge_traits::error::BridgeError {
    fn from(error: MetadataError) -> Self {
        match error {
            MetadataError::Io(e) => bridge_traits::error::BridgeError::Io(e),
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}
