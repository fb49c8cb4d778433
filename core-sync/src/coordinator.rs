//! # Sync Coordinator
//!
//! Runs one transfer from a Drive folder tree into Google Photos.
//!
//! ## Workflow
//!
//! 1. Resolve the root folder by name (fatal when missing or ambiguous)
//! 2. Walk the tree lazily, depth-first
//! 3. Filter each file by extension and video duration
//! 4. Transfer accepted files one at a time through the [`TransferPipeline`]
//! 5. Record an outcome per file and append misses to the optional log
//!
//! A failing file never stops the run. A listing error after the root was
//! resolved ends the walk; files already processed stay in the report.
//! Lost credentials are the exception: they abort the run with
//! [`SyncError::Auth`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncContext, SyncCoordinator};
//!
//! let coordinator = SyncCoordinator::new(context);
//! let report = coordinator.run("Trip2023").await?;
//! println!("{}", report);
//! ```

use futures::StreamExt;
use provider_google_drive::{DriveLister, MediaEntry};
use std::pin::pin;
use tracing::{error, info, instrument, warn};

use crate::albums::AlbumRegistry;
use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::filter::FilterDecision;
use crate::pipeline::TransferPipeline;
use crate::report::{MissedFilesLog, TransferRecord, TransferReport, TransferResult};

/// Sequential transfer coordinator
pub struct SyncCoordinator {
    context: SyncContext,
    lister: DriveLister,
    pipeline: TransferPipeline,
    missed_log: Option<MissedFilesLog>,
}

impl SyncCoordinator {
    pub fn new(context: SyncContext) -> Self {
        let lister = DriveLister::new(context.storage.clone());
        let pipeline = TransferPipeline::new(&context);
        let missed_log = context
            .settings
            .missed_log_path
            .as_ref()
            .map(MissedFilesLog::new);

        Self {
            context,
            lister,
            pipeline,
            missed_log,
        }
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    /// Transfer every file below the top-level folder `root_folder_name`
    ///
    /// Returns `Err` for problems that prevent the run from starting (an
    /// unknown or ambiguous root folder, an unusable scratch directory) and for
    /// credentials that can no longer be refreshed mid-run.
    #[instrument(skip(self))]
    pub async fn run(&self, root_folder_name: &str) -> Result<TransferReport> {
        let root = self.lister.resolve_root(root_folder_name).await?;

        tokio::fs::create_dir_all(&self.context.settings.temp_dir)
            .await
            .map_err(|e| {
                SyncError::Config(format!(
                    "Cannot create temp dir {}: {}",
                    self.context.settings.temp_dir.display(),
                    e
                ))
            })?;

        info!(
            root = %root.name,
            max_video_seconds = ?self.context.settings.max_video_seconds,
            "Starting transfer"
        );

        let mut report = TransferReport::new();
        let mut albums = AlbumRegistry::new(self.context.library.clone());
        let mut entries = pin!(self.lister.entries(&root));

        while let Some(next) = entries.next().await {
            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    let error = SyncError::from(e);
                    if error.is_fatal() {
                        error!(error = %error, processed = report.records().len(), "Run aborted");
                        return Err(error);
                    }
                    error!(error = %error, "Folder walk failed");
                    report.set_listing_error(error.to_string());
                    break;
                }
            };

            let result = match self.process(&entry, &mut albums).await {
                Ok(result) => result,
                Err(error) => {
                    error!(
                        error = %error,
                        folder = %entry.folder,
                        file = %entry.file.name,
                        processed = report.records().len(),
                        "Run aborted"
                    );
                    return Err(error);
                }
            };
            self.record_missed(&entry, &result).await;
            report.push(TransferRecord {
                file_id: entry.file.id,
                file_name: entry.file.name,
                folder: entry.folder,
                result,
            });
        }

        report.set_albums_created(albums.len());
        info!(
            uploaded = report.uploaded(),
            skipped = report.skipped(),
            failed = report.failed(),
            albums = albums.len(),
            "Transfer finished"
        );

        Ok(report)
    }

    async fn process(&self, entry: &MediaEntry, albums: &mut AlbumRegistry) -> Result<TransferResult> {
        let decision = self.pipeline.filter().accept(&entry.file);

        let result = match &decision {
            FilterDecision::Skip(reason) => reason.clone().into(),
            FilterDecision::Accept | FilterDecision::NeedsProbe => {
                self.pipeline.transfer(entry, &decision, albums).await?
            }
        };

        match &result {
            TransferResult::Uploaded { media_item_id } => {
                info!(folder = %entry.folder, file = %entry.file.name, media_item_id = %media_item_id, "Uploaded")
            }
            TransferResult::SkippedUnsupportedType => {
                info!(folder = %entry.folder, file = %entry.file.name, "Skipped unsupported type")
            }
            TransferResult::SkippedDurationExceeded { duration } => info!(
                folder = %entry.folder,
                file = %entry.file.name,
                duration_secs = duration.as_secs_f64(),
                "Skipped long video"
            ),
            TransferResult::Failed { reason } => {
                warn!(folder = %entry.folder, file = %entry.file.name, reason = %reason, "Failed")
            }
        }

        Ok(result)
    }

    async fn record_missed(&self, entry: &MediaEntry, result: &TransferResult) {
        let (Some(log), Some(reason)) = (&self.missed_log, result.missed_reason()) else {
            return;
        };

        if let Err(e) = log.append(&entry.folder, &entry.file.name, &reason).await {
            warn!(path = %log.path().display(), error = %e, "Could not write missed-files log");
        }
    }
}
