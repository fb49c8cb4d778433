//! Google Photos Library API connector
//!
//! Implements the `PhotoLibrary` trait on top of the injected `HttpClient`.

use async_trait::async_trait;
use bridge_traits::consent::AccessTokenProvider;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::photos::{PhotoLibrary, RemoteAlbum, UploadToken};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::GooglePhotosError;
use crate::types::{
    Album, BatchCreateRequest, BatchCreateResponse, CreateAlbumRequest, ErrorEnvelope, NewAlbum,
    NewMediaItem, SimpleMediaItem,
};

/// Google Photos Library API base URL
const PHOTOS_API_BASE: &str = "https://photoslibrary.googleapis.com/v1";

/// Raw uploads carry whole videos
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

const API_TIMEOUT: Duration = Duration::from_secs(60);

/// Google Photos Library API connector
///
/// Album creation and `batchCreate` are sent once, without automatic retry.
/// Raw uploads are retried.
pub struct GooglePhotosConnector {
    http_client: Arc<dyn HttpClient>,
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: String,
}

impl GooglePhotosConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            http_client,
            tokens,
            base_url: PHOTOS_API_BASE.to_string(),
        }
    }

    /// Point the connector at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Extract `error.message` from an error body, falling back to the raw text
    fn error_message(response: &HttpResponse) -> String {
        serde_json::from_slice::<ErrorEnvelope>(&response.body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .unwrap_or_else(|| String::from_utf8_lossy(&response.body).trim().to_string())
    }

    fn status_error(response: &HttpResponse) -> GooglePhotosError {
        match response.status {
            401 | 403 => GooglePhotosError::AuthenticationFailed(Self::error_message(response)),
            429 => GooglePhotosError::RateLimitExceeded {
                retry_after_seconds: response.retry_after_seconds().unwrap_or(60),
            },
            status_code => GooglePhotosError::ApiError {
                status_code,
                message: Self::error_message(response),
            },
        }
    }

    async fn send(&self, request: HttpRequest, policy: RetryPolicy) -> Result<HttpResponse> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http_client
            .execute_with_retry(request.bearer_token(token), policy)
            .await?;

        if !response.is_success() {
            warn!(status = response.status, "Photos API request failed");
            return Err(Self::status_error(&response).into());
        }

        Ok(response)
    }
}

#[async_trait]
impl PhotoLibrary for GooglePhotosConnector {
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn upload_bytes(&self, file_name: &str, data: Bytes) -> Result<UploadToken> {
        let request = HttpRequest::new(HttpMethod::Post, format!("{}/uploads", self.base_url))
            .header("Content-Type", "application/octet-stream")
            .header("X-Goog-Upload-File-Name", file_name)
            .header("X-Goog-Upload-Protocol", "raw")
            .body(data)
            .timeout(UPLOAD_TIMEOUT);

        let response = self.send(request, RetryPolicy::default()).await?;
        let token = response.text()?.trim().to_string();

        if token.is_empty() {
            return Err(GooglePhotosError::ParseError("Upload returned an empty token".into()).into());
        }

        debug!("Bytes uploaded");
        Ok(UploadToken::new(token))
    }

    #[instrument(skip(self))]
    async fn create_album(&self, title: &str) -> Result<RemoteAlbum> {
        let request = HttpRequest::new(HttpMethod::Post, format!("{}/albums", self.base_url))
            .json(&CreateAlbumRequest {
                album: NewAlbum { title },
            })?
            .timeout(API_TIMEOUT);

        let response = self.send(request, RetryPolicy::no_retry()).await?;
        let album: Album = serde_json::from_slice(&response.body).map_err(|e| {
            GooglePhotosError::ParseError(format!("Failed to parse album response: {}", e))
        })?;

        info!(album_id = %album.id, "Album created");
        Ok(RemoteAlbum {
            title: album.title.unwrap_or_else(|| title.to_string()),
            id: album.id,
        })
    }

    #[instrument(skip(self, upload_token))]
    async fn create_media_item(
        &self,
        album_id: &str,
        upload_token: &UploadToken,
        file_name: &str,
    ) -> Result<String> {
        let body = BatchCreateRequest {
            album_id,
            new_media_items: vec![NewMediaItem {
                simple_media_item: SimpleMediaItem {
                    upload_token: upload_token.as_str(),
                    file_name,
                },
            }],
        };
        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/mediaItems:batchCreate", self.base_url),
        )
        .json(&body)?
        .timeout(API_TIMEOUT);

        let response = self.send(request, RetryPolicy::no_retry()).await?;
        let parsed: BatchCreateResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GooglePhotosError::ParseError(format!("Failed to parse batchCreate response: {}", e))
        })?;

        let result = parsed.new_media_item_results.into_iter().next().ok_or_else(|| {
            GooglePhotosError::ParseError("batchCreate returned no item results".into())
        })?;

        if !result.status.is_ok() {
            return Err(GooglePhotosError::ItemRejected {
                file_name: file_name.to_string(),
                message: result
                    .status
                    .message
                    .unwrap_or_else(|| format!("status code {}", result.status.code.unwrap_or(-1))),
            }
            .into());
        }

        let media_item = result.media_item.ok_or_else(|| {
            GooglePhotosError::ParseError("batchCreate result has no media item".into())
        })?;

        debug!(media_item_id = %media_item.id, "Media item created");
        Ok(media_item.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::consent::StaticAccessToken;
    use bridge_traits::error::BridgeError;
    use bridge_traits::storage::ByteStream;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
            async fn execute_with_retry(
                &self,
                request: HttpRequest,
                policy: RetryPolicy,
            ) -> Result<HttpResponse>;
            async fn download_stream(&self, request: HttpRequest) -> Result<ByteStream>;
        }
    }

    fn connector(mock_http: MockHttpClient) -> GooglePhotosConnector {
        GooglePhotosConnector::new(
            Arc::new(mock_http),
            Arc::new(StaticAccessToken::new("photos_token")),
        )
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
        req.headers.get(name).map(String::as_str)
    }

    #[tokio::test]
    async fn test_upload_bytes_sends_raw_protocol() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .withf(|req, _| {
                req.method == HttpMethod::Post
                    && req.url == "https://photoslibrary.googleapis.com/v1/uploads"
                    && header(req, "Authorization") == Some("Bearer photos_token")
                    && header(req, "Content-Type") == Some("application/octet-stream")
                    && header(req, "X-Goog-Upload-File-Name") == Some("IMG_0001.JPG")
                    && header(req, "X-Goog-Upload-Protocol") == Some("raw")
                    && req.body.as_deref() == Some(&b"jpegdata"[..])
            })
            .times(1)
            .returning(|_, _| Ok(response(200, "CAIS-upload-token\n")));

        let token = connector(mock_http)
            .upload_bytes("IMG_0001.JPG", Bytes::from_static(b"jpegdata"))
            .await
            .unwrap();

        assert_eq!(token.as_str(), "CAIS-upload-token");
    }

    #[tokio::test]
    async fn test_upload_bytes_error_message_from_envelope() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute_with_retry().returning(|_, _| {
            Ok(response(
                400,
                r#"{"error": {"code": 400, "message": "Unsupported file type"}}"#,
            ))
        });

        let result = connector(mock_http)
            .upload_bytes("notes.txt", Bytes::from_static(b"x"))
            .await;

        assert!(matches!(
            result,
            Err(BridgeError::OperationFailed(msg)) if msg.contains("(status 400): Unsupported file type")
        ));
    }

    #[tokio::test]
    async fn test_upload_bytes_rate_limited() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .returning(|_, _| Ok(response(429, "Quota exceeded")));

        let result = connector(mock_http)
            .upload_bytes("a.jpg", Bytes::from_static(b"x"))
            .await;

        assert!(matches!(result, Err(BridgeError::OperationFailed(msg)) if msg.contains("Rate limit")));
    }

    #[tokio::test]
    async fn test_create_album_without_retry() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .withf(|req, policy| {
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                req.url.ends_with("/v1/albums")
                    && body["album"]["title"] == "Trip2023"
                    && policy.max_attempts == 1
            })
            .times(1)
            .returning(|_, _| {
                Ok(response(
                    200,
                    r#"{"id": "album-1", "title": "Trip2023", "isWriteable": true}"#,
                ))
            });

        let album = connector(mock_http).create_album("Trip2023").await.unwrap();
        assert_eq!(
            album,
            RemoteAlbum {
                id: "album-1".to_string(),
                title: "Trip2023".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_create_media_item_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute_with_retry()
            .withf(|req, _| {
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                req.url.ends_with("/v1/mediaItems:batchCreate")
                    && body["albumId"] == "album-1"
                    && body["newMediaItems"][0]["simpleMediaItem"]["uploadToken"] == "tok"
            })
            .times(1)
            .returning(|_, _| {
                Ok(response(
                    200,
                    r#"{"newMediaItemResults": [{"uploadToken": "tok",
                        "status": {"message": "Success"},
                        "mediaItem": {"id": "media-9", "filename": "a.jpg"}}]}"#,
                ))
            });

        let id = connector(mock_http)
            .create_media_item("album-1", &UploadToken::new("tok"), "a.jpg")
            .await
            .unwrap();
        assert_eq!(id, "media-9");
    }

    #[tokio::test]
    async fn test_create_media_item_rejected_item() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute_with_retry().returning(|_, _| {
            Ok(response(
                200,
                r#"{"newMediaItemResults": [{"uploadToken": "tok",
                    "status": {"code": 3, "message": "Failed: invalid media"}}]}"#,
            ))
        });

        let result = connector(mock_http)
            .create_media_item("album-1", &UploadToken::new("tok"), "a.mov")
            .await;

        assert!(matches!(
            result,
            Err(BridgeError::OperationFailed(msg)) if msg.contains("rejected for 'a.mov'")
        ));
    }

    #[tokio::test]
    async fn test_create_media_item_auth_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute_with_retry().returning(|_, _| {
            Ok(response(
                403,
                r#"{"error": {"code": 403, "message": "Request had insufficient authentication scopes."}}"#,
            ))
        });

        let result = connector(mock_http)
            .create_media_item("album-1", &UploadToken::new("tok"), "a.jpg")
            .await;

        assert!(matches!(
            result,
            Err(BridgeError::OperationFailed(msg)) if msg.contains("insufficient authentication scopes")
        ));
    }
}
