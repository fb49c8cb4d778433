//! # Album Registry
//!
//! Maps each source folder to the album created for it during the current
//! run. Nothing is persisted: a second run creates new albums with the same
//! titles.

use bridge_traits::error::Result;
use bridge_traits::photos::{PhotoLibrary, RemoteAlbum};
use provider_google_drive::FolderPath;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-run `FolderPath` to album cache
pub struct AlbumRegistry {
    library: Arc<dyn PhotoLibrary>,
    albums: HashMap<FolderPath, RemoteAlbum>,
}

impl AlbumRegistry {
    pub fn new(library: Arc<dyn PhotoLibrary>) -> Self {
        Self {
            library,
            albums: HashMap::new(),
        }
    }

    /// Album id for `path`, creating the album on first use
    ///
    /// The album is titled after the last path segment. A failed creation is
    /// not cached, so the next file of the same folder tries again.
    pub async fn get_or_create(&mut self, path: &FolderPath) -> Result<String> {
        if let Some(album) = self.albums.get(path) {
            debug!(folder = %path, album_id = %album.id, "Album cached");
            return Ok(album.id.clone());
        }

        let album = self.library.create_album(path.last()).await?;
        info!(folder = %path, album_id = %album.id, title = %album.title, "Album created for folder");

        let id = album.id.clone();
        self.albums.insert(path.clone(), album);
        Ok(id)
    }

    /// Number of albums created during this run
    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }
}
