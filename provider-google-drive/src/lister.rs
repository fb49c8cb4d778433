//! Recursive folder walk
//!
//! Turns the page-oriented `StorageProvider` primitives into a lazy stream of
//! media entries, each tagged with the path of the folder that contains it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use bridge_traits::storage::{RemoteFile, StorageProvider};
use futures::stream::{self, Stream};
use tracing::{debug, info, instrument};

use crate::error::{GoogleDriveError, Result};

/// Prefix shared by Google-native document MIME types (Docs, Sheets, ...)
const NATIVE_MIME_PREFIX: &str = "application/vnd.google-apps.";

/// Ordered folder names from the root folder (inclusive) down to a folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    /// Path consisting of the root folder alone
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Path of a direct subfolder
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    /// Name of the folder this path points at
    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// A listed file together with the folder it was found in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub file: RemoteFile,
    pub folder: FolderPath,
}

/// A folder waiting to be listed
#[derive(Debug, Clone)]
struct PendingFolder {
    id: String,
    path: FolderPath,
}

/// Walk state threaded through the stream
struct WalkState {
    provider: Arc<dyn StorageProvider>,
    stack: Vec<PendingFolder>,
    ready: VecDeque<MediaEntry>,
}

impl WalkState {
    /// List every page of `folder`, queue its files and push its subfolders
    async fn expand(&mut self, folder: PendingFolder) -> Result<()> {
        let mut subfolders = Vec::new();
        let mut page_token = None;
        let mut pages = 0usize;

        loop {
            let (children, next) = self
                .provider
                .list_children(&folder.id, page_token.take())
                .await?;
            pages += 1;

            for child in children {
                if child.is_folder {
                    subfolders.push(PendingFolder {
                        path: folder.path.child(child.name.clone()),
                        id: child.id,
                    });
                } else if is_native_document(&child) {
                    debug!(name = %child.name, "Skipping Google-native document");
                } else {
                    self.ready.push_back(MediaEntry {
                        file: child,
                        folder: folder.path.clone(),
                    });
                }
            }

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            folder = %folder.path,
            pages,
            files = self.ready.len(),
            subfolders = subfolders.len(),
            "Listed folder"
        );

        // Reverse so the first subfolder by name is popped first
        self.stack.extend(subfolders.into_iter().rev());
        Ok(())
    }
}

fn is_native_document(file: &RemoteFile) -> bool {
    file.mime_type
        .as_deref()
        .is_some_and(|mime| mime.starts_with(NATIVE_MIME_PREFIX))
}

/// Depth-first lister over a storage provider
///
/// # Example
///
/// ```ignore
/// use futures::TryStreamExt;
///
/// let lister = DriveLister::new(provider);
/// let mut entries = Box::pin(lister.list_media("Trip2023").await?);
/// while let Some(entry) = entries.try_next().await? {
///     println!("{} / {}", entry.folder, entry.file.name);
/// }
/// ```
#[derive(Clone)]
pub struct DriveLister {
    provider: Arc<dyn StorageProvider>,
}

impl DriveLister {
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// Resolve a top-level folder name to exactly one folder
    #[instrument(skip(self))]
    pub async fn resolve_root(&self, name: &str) -> Result<RemoteFile> {
        let mut matches = self.provider.find_root_folders(name).await?;

        match matches.len() {
            0 => Err(GoogleDriveError::RootFolderNotFound {
                name: name.to_string(),
            }),
            1 => {
                let root = matches.remove(0);
                info!(folder_id = %root.id, "Root folder resolved");
                Ok(root)
            }
            count => Err(GoogleDriveError::RootFolderAmbiguous {
                name: name.to_string(),
                count,
            }),
        }
    }

    /// Lazily walk the tree below `root`
    ///
    /// Folders are listed only as the consumer advances. The stream ends after
    /// the first listing error.
    pub fn entries(&self, root: &RemoteFile) -> impl Stream<Item = Result<MediaEntry>> + Send {
        let state = WalkState {
            provider: Arc::clone(&self.provider),
            stack: vec![PendingFolder {
                id: root.id.clone(),
                path: FolderPath::root(root.name.clone()),
            }],
            ready: VecDeque::new(),
        };

        stream::try_unfold(state, |mut state| async move {
            loop {
                if let Some(entry) = state.ready.pop_front() {
                    return Ok(Some((entry, state)));
                }
                match state.stack.pop() {
                    Some(folder) => state.expand(folder).await?,
                    None => return Ok(None),
                }
            }
        })
    }

    /// Resolve `root_name`, then stream every file below it
    pub async fn list_media(
        &self,
        root_name: &str,
    ) -> Result<impl Stream<Item = Result<MediaEntry>> + Send> {
        let root = self.resolve_root(root_name).await?;
        Ok(self.entries(&root))
    }
}
