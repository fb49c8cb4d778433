//! # Google Photos Provider
//!
//! Implements the `PhotoLibrary` trait for the Google Photos Library API v1.
//!
//! ## Overview
//!
//! A media item is created in two steps:
//! 1. The raw bytes are posted to `/v1/uploads`, which answers with a
//!    short-lived upload token.
//! 2. `/v1/mediaItems:batchCreate` exchanges the token for a media item and
//!    places it in an album.
//!
//! Albums are created with `/v1/albums`. The API never deduplicates titles.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GooglePhotosConnector;
pub use error::{GooglePhotosError, Result};
