//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the transfer tool:
//! - Logging and tracing infrastructure
//! - Run settings with fail-fast validation
//! - Shared runtime errors

pub mod config;
pub mod error;
pub mod logging;

pub use config::{SyncSettings, SyncSettingsBuilder};
pub use error::{Error, Result};
