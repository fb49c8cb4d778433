//! Per-file outcomes and the end-of-run summary

use provider_google_drive::FolderPath;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::filter::SkipReason;

/// Outcome of one listed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult {
    Uploaded { media_item_id: String },
    SkippedUnsupportedType,
    SkippedDurationExceeded { duration: Duration },
    Failed { reason: String },
}

impl TransferResult {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, TransferResult::Uploaded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            TransferResult::SkippedUnsupportedType | TransferResult::SkippedDurationExceeded { .. }
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TransferResult::Failed { .. })
    }

    /// Reason written to the missed-files log, `None` for uploads
    pub fn missed_reason(&self) -> Option<String> {
        match self {
            TransferResult::Uploaded { .. } => None,
            TransferResult::SkippedUnsupportedType => Some(SkipReason::UnsupportedType.to_string()),
            TransferResult::SkippedDurationExceeded { duration } => {
                Some(format!("too long ({:.1}s)", duration.as_secs_f64()))
            }
            TransferResult::Failed { reason } => Some(reason.clone()),
        }
    }
}

impl From<SkipReason> for TransferResult {
    fn from(reason: SkipReason) -> Self {
        match reason {
            SkipReason::UnsupportedType => TransferResult::SkippedUnsupportedType,
            SkipReason::DurationExceeded { duration, .. } => {
                TransferResult::SkippedDurationExceeded { duration }
            }
        }
    }
}

/// One row of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub file_id: String,
    pub file_name: String,
    pub folder: FolderPath,
    pub result: TransferResult,
}

/// Ordered outcomes of a run
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    records: Vec<TransferRecord>,
    listing_error: Option<String>,
    albums_created: usize,
}

impl TransferReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TransferRecord) {
        self.records.push(record);
    }

    /// Note that the folder walk stopped early
    pub fn set_listing_error(&mut self, error: impl Into<String>) {
        self.listing_error = Some(error.into());
    }

    pub fn set_albums_created(&mut self, count: usize) {
        self.albums_created = count;
    }

    pub fn records(&self) -> &[TransferRecord] {
        &self.records
    }

    pub fn listing_error(&self) -> Option<&str> {
        self.listing_error.as_deref()
    }

    pub fn albums_created(&self) -> usize {
        self.albums_created
    }

    pub fn uploaded(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_uploaded()).count()
    }

    pub fn skipped(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_failed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TransferRecord> {
        self.records.iter().filter(|r| r.result.is_failed())
    }

    /// Whether every listed file was either uploaded or deliberately skipped
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.listing_error.is_none()
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Uploaded: {}  Skipped: {}  Failed: {}  Albums created: {}",
            self.uploaded(),
            self.skipped(),
            self.failed(),
            self.albums_created
        )?;

        for record in self.failures() {
            if let TransferResult::Failed { reason } = &record.result {
                writeln!(f, "  failed: {}/{}: {}", record.folder, record.file_name, reason)?;
            }
        }

        if let Some(error) = &self.listing_error {
            writeln!(f, "  listing stopped early: {}", error)?;
        }

        Ok(())
    }
}

/// Append-only text log of files that were not uploaded
///
/// One line per file: `<folder> - <name> : <reason>`.
#[derive(Debug, Clone)]
pub struct MissedFilesLog {
    path: PathBuf,
}

impl MissedFilesLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_line(folder: &FolderPath, file_name: &str, reason: &str) -> String {
        format!("{} - {} : {}\n", folder, file_name, reason)
    }

    pub async fn append(&self, folder: &FolderPath, file_name: &str, reason: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(Self::format_line(folder, file_name, reason).as_bytes())
            .await?;
        file.flush().await
    }
}
