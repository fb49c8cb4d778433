//! Photo Library Abstraction
//!
//! The write side of a transfer: raw byte upload, album creation and media
//! item registration.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

use crate::error::Result;

/// Short-lived token returned by a raw byte upload
///
/// It is exchanged for a permanent media item and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadToken(String);

impl UploadToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are bearer-like; keep them out of logs
impl fmt::Debug for UploadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UploadToken([REDACTED])")
    }
}

/// An album created in the remote library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAlbum {
    pub id: String,
    pub title: String,
}

/// Photo library trait
///
/// Implemented by `provider-google-photos`.
#[async_trait]
pub trait PhotoLibrary: Send + Sync {
    /// Upload raw bytes and obtain an upload token
    async fn upload_bytes(&self, file_name: &str, data: Bytes) -> Result<UploadToken>;

    /// Create a new album with the given title
    ///
    /// The remote API does not deduplicate by title: two calls with the same
    /// title create two albums.
    async fn create_album(&self, title: &str) -> Result<RemoteAlbum>;

    /// Register an uploaded item as a media item inside an album
    ///
    /// Returns the identifier of the created media item.
    async fn create_media_item(
        &self,
        album_id: &str,
        upload_token: &UploadToken,
        file_name: &str,
    ) -> Result<String>;
}
