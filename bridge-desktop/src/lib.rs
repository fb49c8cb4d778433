//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `AuthorizationPrompt` using a loopback redirect listener
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LoopbackAuthorizationPrompt, ReqwestHttpClient};
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let prompt = Arc::new(LoopbackAuthorizationPrompt::bind().await?);
//! ```

mod consent;
mod http;

pub use consent::LoopbackAuthorizationPrompt;
pub use http::ReqwestHttpClient;
