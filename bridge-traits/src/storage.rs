//! Remote Storage Abstraction
//!
//! The read side of a transfer: locating a folder by name, listing its
//! children page by page and downloading file content as a stream.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::Result;

/// MIME type Google Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Streamed body of a downloaded file
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// A file or folder as reported by the storage provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Provider-specific identifier
    pub id: String,
    /// Display name, including extension
    pub name: String,
    /// MIME type, if the provider reports one
    pub mime_type: Option<String>,
    /// Size in bytes (absent for folders and native documents)
    pub size: Option<u64>,
    /// Whether this entry is a folder
    pub is_folder: bool,
    /// Video duration reported by the provider, in milliseconds
    pub video_duration_ms: Option<u64>,
}

impl RemoteFile {
    /// Lower-cased text after the last `.` of the name, if any
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// Storage provider trait
///
/// Implemented by `provider-google-drive`. The traversal logic lives outside
/// the provider and only relies on these three primitives.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::StorageProvider;
///
/// async fn first_page(provider: &dyn StorageProvider) -> Result<()> {
///     let roots = provider.find_root_folders("Trip2023").await?;
///     let (children, next) = provider.list_children(&roots[0].id, None).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Find top-level folders whose name matches `name` exactly
    async fn find_root_folders(&self, name: &str) -> Result<Vec<RemoteFile>>;

    /// List one page of the direct children of a folder
    ///
    /// Returns the entries and the token of the next page, `None` on the last
    /// page.
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<(Vec<RemoteFile>, Option<String>)>;

    /// Download the full content of a file
    async fn download(&self, file_id: &str) -> Result<ByteStream>;
}
