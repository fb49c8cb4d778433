//! Video Duration Probing
//!
//! Reads the play time of a local media file from its container headers.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::probe::{DurationProbe, LoftyDurationProbe};
//! use std::path::Path;
//!
//! let probe = LoftyDurationProbe::new();
//! match probe.probe(Path::new("clip.mp4")).await? {
//!     Some(duration) => println!("{}s", duration.as_secs()),
//!     None => println!("duration unknown"),
//! }
//! ```

use async_trait::async_trait;
use lofty::config::ParseOptions;
use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{MetadataError, Result};

/// Determines the play time of a local media file
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Probe the file at `path`
    ///
    /// Returns `Ok(None)` when the container is not recognised or does not
    /// record a duration. Errors are reserved for files that cannot be read.
    async fn probe(&self, path: &Path) -> Result<Option<Duration>>;
}

/// `DurationProbe` backed by `lofty`
///
/// Recognises MP4/MOV (ISO base media) and WAV containers among the default
/// video extensions. Others (AVI, MKV) report an unknown duration.
#[derive(Debug, Clone, Copy)]
pub struct LoftyDurationProbe {
    parse_options: ParseOptions,
}

impl LoftyDurationProbe {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    fn probe_blocking(path: PathBuf, options: ParseOptions) -> Result<Option<Duration>> {
        let probe = Probe::open(&path)
            .map_err(|e| MetadataError::ProbeFailed(format!("Failed to open file: {}", e)))?
            .options(options)
            .guess_file_type()
            .map_err(|e| MetadataError::ProbeFailed(format!("Failed to read header: {}", e)))?;

        let Some(file_type) = probe.file_type() else {
            debug!("Container not recognised");
            return Ok(None);
        };

        let tagged_file = match probe.read() {
            Ok(file) => file,
            Err(e) => {
                debug!(?file_type, error = %e, "Container could not be parsed");
                return Ok(None);
            }
        };

        let duration = tagged_file.properties().duration();
        debug!(?file_type, duration_ms = duration.as_millis() as u64, "Probed container");

        // lofty reports zero when the container carries no timing
        Ok((!duration.is_zero()).then_some(duration))
    }
}

impl Default for LoftyDurationProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurationProbe for LoftyDurationProbe {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn probe(&self, path: &Path) -> Result<Option<Duration>> {
        if !tokio::fs::try_exists(path).await? {
            return Err(MetadataError::FileNotFound(path.display().to_string()));
        }

        let path = path.to_path_buf();
        let options = self.parse_options;
        tokio::task::spawn_blocking(move || Self::probe_blocking(path, options))
            .await
            .map_err(|e| MetadataError::ProbeFailed(format!("Probe task failed: {}", e)))?
    }
}

