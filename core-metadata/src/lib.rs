//! # Media Metadata
//!
//! Local inspection of downloaded media files.
//!
//! ## Overview
//!
//! Google Drive does not always report a duration for videos it has not
//! finished processing. This crate reads the container of the downloaded copy
//! instead, using `lofty`, so duration limits can still be applied.

pub mod error;
pub mod probe;

pub use error::{MetadataError, Result};
pub use probe::{DurationProbe, LoftyDurationProbe};
