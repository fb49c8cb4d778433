//! # Transfer Core
//!
//! Copies media from a Google Drive folder tree into Google Photos, one album
//! per source folder.
//!
//! ## Components
//!
//! - **Media Filter** (`filter`): extension allow-lists and the video length limit
//! - **Transfer Pipeline** (`pipeline`): download, upload and album placement of one file
//! - **Album Registry** (`albums`): per-run folder to album cache
//! - **Scratch files** (`temp`): self-deleting download targets
//! - **Report** (`report`): per-file outcomes, summary and missed-files log
//! - **Sync Context** (`context`): injected capabilities and settings
//! - **Sync Coordinator** (`coordinator`): drives a whole run

pub mod albums;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod temp;

pub use albums::AlbumRegistry;
pub use context::{SyncContext, SyncContextBuilder};
pub use coordinator::SyncCoordinator;
pub use error::{Result, SyncError};
pub use filter::{FilterDecision, MediaFilter, MediaKind, SkipReason};
pub use pipeline::TransferPipeline;
pub use report::{MissedFilesLog, TransferRecord, TransferReport, TransferResult};
pub use temp::ScopedTempFile;
