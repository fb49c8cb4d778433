//! # Host Bridge Traits
//!
//! Capability traits that separate the transfer logic from the concrete
//! services it talks to.
//!
//! ## Overview
//!
//! Every remote or interactive capability the sync core needs is expressed as
//! a trait here and injected as `Arc<dyn Trait>`. Production wiring uses the
//! implementations from `bridge-desktop` and the provider crates; tests swap in
//! in-memory fakes or `mockall` mocks.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and streaming downloads
//!
//! ### Remote services
//! - [`StorageProvider`](storage::StorageProvider) - Folder lookup, listing and downloads (Google Drive)
//! - [`PhotoLibrary`](photos::PhotoLibrary) - Byte upload, album and media item creation (Google Photos)
//!
//! ### Interaction
//! - [`AuthorizationPrompt`](consent::AuthorizationPrompt) - Interactive OAuth consent
//! - [`AccessTokenProvider`](consent::AccessTokenProvider) - Bearer tokens for API clients
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Provider
//! crates convert their own error enums into `BridgeError` at the trait
//! boundary so the sync core handles a single error type per capability.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! behind `Arc` across async tasks.

pub mod consent;
pub mod error;
pub mod http;
pub mod photos;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use consent::{
    AccessTokenProvider, AuthorizationPrompt, AuthorizationResponse, StaticAccessToken,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use photos::{PhotoLibrary, RemoteAlbum, UploadToken};
pub use storage::{ByteStream, RemoteFile, StorageProvider, FOLDER_MIME_TYPE};
