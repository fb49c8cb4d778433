//! Per-file scratch storage

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Longest sanitized name kept in a scratch file name
const MAX_NAME_LEN: usize = 64;

/// A scratch file removed when dropped
///
/// Cleanup runs on success, on error and on early return alike.
#[derive(Debug)]
pub struct ScopedTempFile {
    path: PathBuf,
}

impl ScopedTempFile {
    /// Create an empty file in `dir` named after `file_name`
    ///
    /// The directory is created if needed. The returned handle is open for
    /// writing.
    pub async fn create(dir: &Path, file_name: &str) -> std::io::Result<(Self, tokio::fs::File)> {
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(format!("{}-{}", Uuid::new_v4(), sanitize(file_name)));
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), "Created scratch file");
        Ok((Self { path }, file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedTempFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed scratch file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file"),
        }
    }
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; replace everything else
fn sanitize(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Keep the tail so the extension survives
    let start = cleaned.len().saturating_sub(MAX_NAME_LEN);
    let tail = cleaned[start..].trim_start_matches('.');
    if tail.is_empty() {
        "file".to_string()
    } else {
        tail.to_string()
    }
}
