//! # Media Filter
//!
//! Decides whether a listed file is worth transferring. Decisions use only
//! the listing metadata; when Drive has not reported a video's duration the
//! filter asks the pipeline to probe the downloaded copy instead.

use bridge_traits::storage::RemoteFile;
use core_runtime::config::SyncSettings;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Kind of media an extension belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Why a file is not transferred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Extension outside the allow-lists
    UnsupportedType,
    /// Video longer than the configured limit
    DurationExceeded { duration: Duration, limit: Duration },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedType => f.write_str("unsupported"),
            SkipReason::DurationExceeded { duration, .. } => {
                write!(f, "too long ({:.1}s)", duration.as_secs_f64())
            }
        }
    }
}

/// Outcome of filtering a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Accept,
    Skip(SkipReason),
    /// A video whose duration is unknown while a limit is set
    NeedsProbe,
}

/// Extension and duration based filter
#[derive(Debug, Clone)]
pub struct MediaFilter {
    image_extensions: BTreeSet<String>,
    video_extensions: BTreeSet<String>,
    max_video_duration: Option<Duration>,
}

impl MediaFilter {
    /// Extensions are expected in lower case without the leading dot
    pub fn new(
        image_extensions: BTreeSet<String>,
        video_extensions: BTreeSet<String>,
        max_video_seconds: Option<u64>,
    ) -> Self {
        Self {
            image_extensions,
            video_extensions,
            max_video_duration: max_video_seconds.map(Duration::from_secs),
        }
    }

    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self::new(
            settings.image_extensions.clone(),
            settings.video_extensions.clone(),
            settings.max_video_seconds,
        )
    }

    pub fn max_video_duration(&self) -> Option<Duration> {
        self.max_video_duration
    }

    /// Classify a file by extension
    fn media_kind(&self, file: &RemoteFile) -> Option<MediaKind> {
        let extension = file.extension()?;
        if self.image_extensions.contains(&extension) {
            Some(MediaKind::Image)
        } else if self.video_extensions.contains(&extension) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn accept(&self, file: &RemoteFile) -> FilterDecision {
        if file.is_folder {
            return FilterDecision::Skip(SkipReason::UnsupportedType);
        }

        match self.media_kind(file) {
            None => FilterDecision::Skip(SkipReason::UnsupportedType),
            Some(MediaKind::Image) => FilterDecision::Accept,
            Some(MediaKind::Video) => match (self.max_video_duration, file.video_duration_ms) {
                (None, _) => FilterDecision::Accept,
                (Some(_), Some(ms)) => self.decide_duration(Duration::from_millis(ms)),
                (Some(_), None) => FilterDecision::NeedsProbe,
            },
        }
    }

    /// Apply the video limit to a known duration; equal to the limit passes
    pub fn decide_duration(&self, duration: Duration) -> FilterDecision {
        match self.max_video_duration {
            Some(limit) if duration > limit => {
                FilterDecision::Skip(SkipReason::DurationExceeded { duration, limit })
            }
            _ => FilterDecision::Accept,
        }
    }
}
