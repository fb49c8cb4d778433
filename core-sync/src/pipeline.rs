//! # Transfer Pipeline
//!
//! Moves one accepted file from Drive into an album:
//!
//! 1. Stream the download into a [`ScopedTempFile`]
//! 2. Probe the local copy when the listing carried no video duration
//! 3. Upload the bytes and receive an upload token
//! 4. Resolve the folder's album through the [`AlbumRegistry`]
//! 5. Exchange the token for a media item inside that album
//!
//! Per-file errors become [`TransferResult::Failed`]; credential failures
//! propagate. The scratch file is removed on every path.

use bridge_traits::error::BridgeError;
use bridge_traits::photos::PhotoLibrary;
use bridge_traits::storage::StorageProvider;
use bytes::Bytes;
use core_metadata::DurationProbe;
use core_runtime::logging::strip_path;
use provider_google_drive::MediaEntry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::albums::AlbumRegistry;
use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::filter::{FilterDecision, MediaFilter};
use crate::report::TransferResult;
use crate::temp::ScopedTempFile;

/// Per-file download, upload and album placement
pub struct TransferPipeline {
    storage: Arc<dyn StorageProvider>,
    library: Arc<dyn PhotoLibrary>,
    probe: Arc<dyn DurationProbe>,
    filter: MediaFilter,
    temp_dir: PathBuf,
}

impl TransferPipeline {
    pub fn new(context: &SyncContext) -> Self {
        Self {
            storage: Arc::clone(&context.storage),
            library: Arc::clone(&context.library),
            probe: Arc::clone(&context.probe),
            filter: MediaFilter::from_settings(&context.settings),
            temp_dir: context.settings.temp_dir.clone(),
        }
    }

    pub fn filter(&self) -> &MediaFilter {
        &self.filter
    }

    /// Transfer one entry the filter did not skip
    ///
    /// `decision` is the filter's verdict for the entry: `Accept` or
    /// `NeedsProbe`. Per-file problems come back as `TransferResult::Failed`;
    /// `Err` is reserved for errors that end the run, such as lost credentials.
    #[instrument(skip_all, fields(folder = %entry.folder, file = %entry.file.name))]
    pub async fn transfer(
        &self,
        entry: &MediaEntry,
        decision: &FilterDecision,
        albums: &mut AlbumRegistry,
    ) -> Result<TransferResult> {
        match self.try_transfer(entry, decision, albums).await {
            Ok(result) => Ok(result),
            Err(e) if e.is_fatal() => Err(e),
            Err(SyncError::TransferFailed(reason)) => {
                warn!(reason = %reason, "File transfer failed");
                Ok(TransferResult::Failed { reason })
            }
            Err(e) => {
                warn!(error = %e, "File transfer failed");
                Ok(TransferResult::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn try_transfer(
        &self,
        entry: &MediaEntry,
        decision: &FilterDecision,
        albums: &mut AlbumRegistry,
    ) -> Result<TransferResult> {
        let file = &entry.file;
        let (scratch, handle) = ScopedTempFile::create(&self.temp_dir, &file.name).await?;

        let bytes = self
            .download_into(&file.id, handle)
            .await
            .map_err(step_failed("download"))?;
        debug!(
            bytes,
            scratch = %strip_path(&scratch.path().to_string_lossy()),
            "Downloaded"
        );

        if matches!(decision, FilterDecision::NeedsProbe) {
            if let Some(skipped) = self.probe_duration(scratch.path()).await {
                return Ok(skipped);
            }
        }

        let data = tokio::fs::read(scratch.path()).await?;
        let upload_token = self
            .library
            .upload_bytes(&file.name, Bytes::from(data))
            .await
            .map_err(step_failed("upload"))?;

        let album_id = albums
            .get_or_create(&entry.folder)
            .await
            .map_err(step_failed("album"))?;
        let media_item_id = self
            .library
            .create_media_item(&album_id, &upload_token, &file.name)
            .await
            .map_err(step_failed("media item"))?;

        Ok(TransferResult::Uploaded { media_item_id })
    }

    async fn download_into(
        &self,
        file_id: &str,
        mut handle: tokio::fs::File,
    ) -> std::result::Result<u64, BridgeError> {
        let mut stream = self.storage.download(file_id).await?;
        let bytes = tokio::io::copy(&mut stream, &mut handle).await?;
        handle.flush().await?;
        Ok(bytes)
    }

    /// `Some` when the probed duration exceeds the limit
    ///
    /// An unknown duration or a failed probe lets the file through.
    async fn probe_duration(&self, path: &Path) -> Option<TransferResult> {
        match self.probe.probe(path).await {
            Ok(Some(duration)) => match self.filter.decide_duration(duration) {
                FilterDecision::Skip(reason) => Some(reason.into()),
                _ => None,
            },
            Ok(None) => {
                debug!("Duration unknown after probing, accepting");
                None
            }
            Err(e) => {
                warn!(error = %e, "Duration probe failed, accepting");
                None
            }
        }
    }
}

/// Label a per-file bridge error with the step that failed
///
/// Credential failures keep their own type so the run can stop on them.
fn step_failed(step: &'static str) -> impl Fn(BridgeError) -> SyncError {
    move |error| match error {
        BridgeError::Unauthorized(_) => error.into(),
        other => SyncError::TransferFailed(format!("{} failed: {}", step, other)),
    }
}
