//! # Sync Context
//!
//! Explicit bundle of the capabilities and settings a transfer run uses.
//! There is no global state: everything the coordinator touches is reachable
//! from a `SyncContext`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncContext;
//!
//! // Production: authenticate and wire the Google connectors
//! let context = SyncContext::google(settings, http_client, prompt).await?;
//!
//! // Tests: inject fakes
//! let context = SyncContext::builder(settings)
//!     .storage(Arc::new(FakeDrive::default()))
//!     .library(Arc::new(FakePhotos::default()))
//!     .build()?;
//! ```

use bridge_traits::consent::{AccessTokenProvider, AuthorizationPrompt};
use bridge_traits::http::HttpClient;
use bridge_traits::photos::PhotoLibrary;
use bridge_traits::storage::StorageProvider;
use core_auth::{CredentialProvider, InstalledAppCredentials, SharedAccessToken};
use core_metadata::{DurationProbe, LoftyDurationProbe};
use core_runtime::config::SyncSettings;
use core_runtime::logging::redact_if_sensitive;
use core_runtime::Error as RuntimeError;
use provider_google_drive::GoogleDriveConnector;
use provider_google_photos::GooglePhotosConnector;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::Result;

/// Capabilities and settings of one transfer run
#[derive(Clone)]
pub struct SyncContext {
    pub storage: Arc<dyn StorageProvider>,
    pub library: Arc<dyn PhotoLibrary>,
    pub probe: Arc<dyn DurationProbe>,
    pub settings: SyncSettings,
}

impl SyncContext {
    pub fn builder(settings: SyncSettings) -> SyncContextBuilder {
        SyncContextBuilder {
            settings,
            storage: None,
            library: None,
            probe: None,
        }
    }

    /// Obtain credentials and wire the Google Drive and Google Photos connectors
    ///
    /// Credentials are obtained up front, so a consent or refresh failure
    /// surfaces here as `SyncError::Auth` before anything is listed.
    #[instrument(skip_all, fields(credentials = %settings.credentials_path.display()))]
    pub async fn google(
        settings: SyncSettings,
        http_client: Arc<dyn HttpClient>,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Result<Self> {
        let credentials: Arc<dyn CredentialProvider> = Arc::new(InstalledAppCredentials::new(
            settings.credentials_path.clone(),
            settings.token_path.clone(),
            Arc::clone(&http_client),
            prompt,
        ));

        let tokens = credentials.obtain().await?;
        info!(
            access_token = %redact_if_sensitive("access_token", &tokens.access_token),
            expires_at = %tokens.expires_at,
            "Credentials ready"
        );

        let access: Arc<dyn AccessTokenProvider> =
            Arc::new(SharedAccessToken::with_tokens(credentials, tokens));

        Self::builder(settings)
            .storage(Arc::new(GoogleDriveConnector::new(
                Arc::clone(&http_client),
                Arc::clone(&access),
            )))
            .library(Arc::new(GooglePhotosConnector::new(http_client, access)))
            .build()
    }
}

/// Builder for [`SyncContext`]
///
/// Storage and library are required; the probe defaults to
/// [`LoftyDurationProbe`].
pub struct SyncContextBuilder {
    settings: SyncSettings,
    storage: Option<Arc<dyn StorageProvider>>,
    library: Option<Arc<dyn PhotoLibrary>>,
    probe: Option<Arc<dyn DurationProbe>>,
}

impl SyncContextBuilder {
    pub fn storage(mut self, storage: Arc<dyn StorageProvider>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn library(mut self, library: Arc<dyn PhotoLibrary>) -> Self {
        self.library = Some(library);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn build(self) -> Result<SyncContext> {
        let storage = self.storage.ok_or_else(|| {
            RuntimeError::capability_missing("StorageProvider", "no source storage configured")
        })?;
        let library = self.library.ok_or_else(|| {
            RuntimeError::capability_missing("PhotoLibrary", "no destination library configured")
        })?;

        Ok(SyncContext {
            storage,
            library,
            probe: self
                .probe
                .unwrap_or_else(|| Arc::new(LoftyDurationProbe::new())),
            settings: self.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;

    #[test]
    fn test_build_requires_storage_and_library() {
        let settings = SyncSettings::builder().build().unwrap();
        let result = SyncContext::builder(settings).build();

        assert!(matches!(result, Err(SyncError::Config(msg)) if msg.contains("StorageProvider")));
    }
}
