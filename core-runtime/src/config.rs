//! # Transfer Configuration
//!
//! `SyncSettings` holds everything a transfer run needs to know that is not a
//! capability: credential and token locations, the scratch directory for
//! downloads, the media allow-lists and the optional video length limit.
//!
//! Settings are built with [`SyncSettings::builder`] and validated fail-fast
//! in [`SyncSettingsBuilder::build`].
//!
//! ```ignore
//! use core_runtime::config::SyncSettings;
//!
//! let settings = SyncSettings::builder()
//!     .credentials_path("credentials.json")
//!     .token_path("token.json")
//!     .max_video_seconds(300)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Image extensions accepted by default (lower case, without dot)
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "heic", "dng"];

/// Video extensions accepted by default (lower case, without dot)
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "wav"];

const APP_DIR_NAME: &str = "drive-to-photos";

/// Settings of a transfer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// OAuth client secrets file (`credentials.json`)
    pub credentials_path: PathBuf,

    /// Persisted OAuth token file
    pub token_path: PathBuf,

    /// Directory for per-file scratch downloads
    pub temp_dir: PathBuf,

    /// Videos longer than this are skipped; `None` means no limit
    pub max_video_seconds: Option<u64>,

    /// Accepted image extensions, lower case
    pub image_extensions: BTreeSet<String>,

    /// Accepted video extensions, lower case
    pub video_extensions: BTreeSet<String>,

    /// Optional file collecting skipped and failed items
    pub missed_log_path: Option<PathBuf>,
}

impl SyncSettings {
    /// Create a new settings builder
    pub fn builder() -> SyncSettingsBuilder {
        SyncSettingsBuilder::default()
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.credentials_path.as_os_str().is_empty() {
            return Err(Error::Config(
                "credentials_path must not be empty".to_string(),
            ));
        }

        if self.token_path.as_os_str().is_empty() {
            return Err(Error::Config("token_path must not be empty".to_string()));
        }

        if self.temp_dir.as_os_str().is_empty() {
            return Err(Error::Config("temp_dir must not be empty".to_string()));
        }

        if self.max_video_seconds == Some(0) {
            return Err(Error::Config(
                "max_video_seconds must be greater than 0 when set".to_string(),
            ));
        }

        if self.image_extensions.is_empty() && self.video_extensions.is_empty() {
            return Err(Error::Config(
                "At least one image or video extension must be accepted".to_string(),
            ));
        }

        if let Some(ext) = self
            .image_extensions
            .intersection(&self.video_extensions)
            .next()
        {
            return Err(Error::Config(format!(
                "Extension '{}' is listed as both image and video",
                ext
            )));
        }

        Ok(())
    }
}

/// Default scratch directory: `<OS cache dir>/drive-to-photos/downloads`
///
/// Falls back to the system temp directory when the platform has no cache dir.
pub fn default_temp_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join("downloads")
}

/// Builder for [`SyncSettings`]
#[derive(Debug, Default)]
pub struct SyncSettingsBuilder {
    credentials_path: Option<PathBuf>,
    token_path: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    max_video_seconds: Option<u64>,
    image_extensions: Option<Vec<String>>,
    video_extensions: Option<Vec<String>>,
    missed_log_path: Option<PathBuf>,
}

impl SyncSettingsBuilder {
    /// Set the client secrets path (default `credentials.json`)
    pub fn credentials_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    /// Set the token path (default `token.json`)
    pub fn token_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Set the scratch directory (default [`default_temp_dir`])
    pub fn temp_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    /// Skip videos longer than `seconds`
    pub fn max_video_seconds(mut self, seconds: u64) -> Self {
        self.max_video_seconds = Some(seconds);
        self
    }

    /// Set or clear the video length limit
    pub fn max_video_seconds_opt(mut self, seconds: Option<u64>) -> Self {
        self.max_video_seconds = seconds;
        self
    }

    /// Replace the accepted image extensions
    pub fn image_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the accepted video extensions
    pub fn video_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.video_extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Append skipped and failed items to this file
    pub fn missed_log_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.missed_log_path = Some(path.into());
        self
    }

    /// Build and validate the settings
    pub fn build(self) -> Result<SyncSettings> {
        let settings = SyncSettings {
            credentials_path: self
                .credentials_path
                .unwrap_or_else(|| PathBuf::from("credentials.json")),
            token_path: self
                .token_path
                .unwrap_or_else(|| PathBuf::from("token.json")),
            temp_dir: self.temp_dir.unwrap_or_else(default_temp_dir),
            max_video_seconds: self.max_video_seconds,
            image_extensions: normalize_extensions(self.image_extensions, DEFAULT_IMAGE_EXTENSIONS),
            video_extensions: normalize_extensions(self.video_extensions, DEFAULT_VIDEO_EXTENSIONS),
            missed_log_path: self.missed_log_path,
        };

        settings.validate()?;
        Ok(settings)
    }
}

fn normalize_extensions(custom: Option<Vec<String>>, defaults: &[&str]) -> BTreeSet<String> {
    match custom {
        Some(list) => list
            .into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect(),
        None => defaults.iter().map(|ext| ext.to_string()).collect(),
    }
}
