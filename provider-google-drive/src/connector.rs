//! Google Drive API connector implementation
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::consent::AccessTokenProvider;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::storage::{ByteStream, RemoteFile, StorageProvider, FOLDER_MIME_TYPE};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::GoogleDriveError;
use crate::types::{DriveFile, FilesListResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Fields to request for file resources
const FILE_FIELDS: &str = "id,name,mimeType,size,trashed,videoMediaMetadata(durationMillis)";

/// Google Drive API connector
///
/// # Features
///
/// - Exact-name lookup of top-level folders
/// - Paginated listing of a folder's children, folders first, by name
/// - Streaming downloads
/// - Retry with exponential backoff delegated to the `HttpClient`
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::storage::StorageProvider;
///
/// let connector = GoogleDriveConnector::new(http_client, token_provider);
/// let roots = connector.find_root_folders("Trip2023").await?;
/// let (children, next_page) = connector.list_children(&roots[0].id, None).await?;
/// ```
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Source of OAuth 2.0 access tokens with `drive.readonly` scope
    tokens: Arc<dyn AccessTokenProvider>,

    /// API base URL
    base_url: String,
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    pub fn new(http_client: Arc<dyn HttpClient>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            http_client,
            tokens,
            base_url: DRIVE_API_BASE.to_string(),
        }
    }

    /// Point the connector at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Escape a value for use inside a single-quoted Drive query literal
    pub fn escape_query_value(value: &str) -> String {
        value.replace('\\', "\\\\").replace('\'', "\\'")
    }

    /// Convert DriveFile to RemoteFile
    fn convert_file(drive_file: DriveFile) -> RemoteFile {
        let video_duration_ms = drive_file.duration_millis();
        RemoteFile {
            is_folder: drive_file.mime_type == FOLDER_MIME_TYPE,
            size: drive_file.size.as_deref().and_then(|s| s.parse().ok()),
            mime_type: Some(drive_file.mime_type),
            id: drive_file.id,
            name: drive_file.name,
            video_duration_ms,
        }
    }

    fn files_url(&self, query: &str, page_size: u32, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/files?q={}&pageSize={}&orderBy={}&fields={}",
            self.base_url,
            urlencoding::encode(query),
            page_size,
            urlencoding::encode("folder,name"),
            urlencoding::encode(&format!("nextPageToken,files({})", FILE_FIELDS)),
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        url
    }

    /// Map a non-success response to a provider error
    fn status_error(response: &HttpResponse, subject: &str) -> GoogleDriveError {
        Self::classify_status(
            response.status,
            String::from_utf8_lossy(&response.body).to_string(),
            response.retry_after_seconds(),
            subject,
        )
    }

    fn classify_status(
        status: u16,
        message: String,
        retry_after: Option<u64>,
        subject: &str,
    ) -> GoogleDriveError {
        match status {
            401 | 403 if message.contains("rateLimitExceeded") || message.contains("userRateLimitExceeded") => {
                GoogleDriveError::RateLimitExceeded {
                    retry_after_seconds: retry_after.unwrap_or(60),
                }
            }
            401 | 403 => GoogleDriveError::AuthenticationFailed(message),
            404 => GoogleDriveError::FileNotFound {
                file_id: subject.to_string(),
            },
            429 => GoogleDriveError::RateLimitExceeded {
                retry_after_seconds: retry_after.unwrap_or(60),
            },
            status_code => GoogleDriveError::ApiError {
                status_code,
                message,
            },
        }
    }

    /// GET a JSON resource with bearer auth and retry
    #[instrument(skip(self, url), fields(subject = %subject))]
    async fn get_list(&self, url: String, subject: &str) -> Result<FilesListResponse> {
        let token = self.tokens.access_token().await?;
        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(token)
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(30));

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::default())
            .await?;

        if !response.is_success() {
            warn!(status = response.status, "Drive API request failed");
            return Err(Self::status_error(&response, subject).into());
        }

        let list: FilesListResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
        })?;

        if list.incomplete_search {
            warn!("Drive reported an incomplete search");
        }

        Ok(list)
    }
}

#[async_trait]
impl StorageProvider for GoogleDriveConnector {
    #[instrument(skip(self))]
    async fn find_root_folders(&self, name: &str) -> Result<Vec<RemoteFile>> {
        let query = format!(
            "mimeType='{}' and name='{}' and 'root' in parents and trashed=false",
            FOLDER_MIME_TYPE,
            Self::escape_query_value(name)
        );

        let mut folders = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = self.files_url(&query, 100, page_token.as_deref());
            let page = self.get_list(url, name).await?;
            folders.extend(page.files.into_iter().map(Self::convert_file));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(matches = folders.len(), "Resolved root folder candidates");
        Ok(folders)
    }

    #[instrument(skip(self, page_token), fields(folder_id = %folder_id))]
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<(Vec<RemoteFile>, Option<String>)> {
        let query = format!(
            "'{}' in parents and trashed=false",
            Self::escape_query_value(folder_id)
        );
        let url = self.files_url(&query, MAX_PAGE_SIZE, page_token.as_deref());

        let page = self.get_list(url, folder_id).await?;
        let files: Vec<RemoteFile> = page
            .files
            .into_iter()
            .filter(|f| !f.trashed)
            .map(Self::convert_file)
            .collect();

        debug!(
            count = files.len(),
            has_more = page.next_page_token.is_some(),
            "Listed folder page"
        );

        Ok((files, page.next_page_token))
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn download(&self, file_id: &str) -> Result<ByteStream> {
        debug!("Starting download");

        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/files/{}?alt=media",
            self.base_url,
            urlencoding::encode(file_id)
        );
        let request = HttpRequest::new(HttpMethod::Get, url).bearer_token(token);

        self.http_client
            .download_stream(request)
            .await
            .map_err(|e| match e {
                BridgeError::HttpStatus { status, message } => {
                    Self::classify_status(status, message, None, file_id).into()
                }
                other => other,
            })
    }
}
