//! # Google Drive Provider
//!
//! Implements `StorageProvider` trait for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Exact-name resolution of a top-level folder
//! - Paginated listing of folder children, folders first
//! - Streaming downloads
//! - A lazy depth-first walk yielding each file with its folder path

pub mod connector;
pub mod error;
pub mod lister;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
pub use lister::{DriveLister, FolderPath, MediaEntry};
