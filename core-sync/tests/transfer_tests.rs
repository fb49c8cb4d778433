//! Integration tests for complete transfer runs
//!
//! These tests drive `SyncCoordinator` end to end against in-memory fakes:
//! - Root folder resolution failures
//! - Extension and duration filtering, including local probing
//! - Album creation per folder and across reruns
//! - Failure isolation between files
//! - Scratch file cleanup
//! - Missed-files log output
//! - Aborting when credentials cannot be renewed

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    photos::{PhotoLibrary, RemoteAlbum, UploadToken},
    storage::{ByteStream, RemoteFile, StorageProvider, FOLDER_MIME_TYPE},
};
use bytes::Bytes;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_auth::{AuthError, CredentialProvider, OAuthTokens, SharedAccessToken};
use core_metadata::{DurationProbe, MetadataError};
use provider_google_photos::GooglePhotosConnector;
use core_runtime::config::SyncSettings;
use core_sync::{SyncContext, SyncCoordinator, SyncError, TransferResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Fakes
// ============================================================================

/// In-memory Drive: folders by id, file contents by id
#[derive(Default)]
struct FakeDrive {
    roots: Vec<RemoteFile>,
    children: HashMap<String, Vec<RemoteFile>>,
    contents: HashMap<String, Vec<u8>>,
    failing_downloads: HashSet<String>,
    failing_listings: HashSet<String>,
}

impl FakeDrive {
    fn with_root(name: &str) -> Self {
        let mut drive = Self::default();
        drive.roots.push(folder("root", name));
        drive
    }

    fn add_folder(&mut self, parent: &str, id: &str, name: &str) {
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(folder(id, name));
    }

    fn add_file(&mut self, parent: &str, id: &str, name: &str, duration_ms: Option<u64>) {
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(RemoteFile {
                id: id.to_string(),
                name: name.to_string(),
                mime_type: Some("application/octet-stream".to_string()),
                size: Some(4),
                is_folder: false,
                video_duration_ms: duration_ms,
            });
        self.contents.insert(id.to_string(), id.as_bytes().to_vec());
    }
}

fn folder(id: &str, name: &str) -> RemoteFile {
    RemoteFile {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: Some(FOLDER_MIME_TYPE.to_string()),
        size: None,
        is_folder: true,
        video_duration_ms: None,
    }
}

#[async_trait]
impl StorageProvider for FakeDrive {
    async fn find_root_folders(&self, name: &str) -> BridgeResult<Vec<RemoteFile>> {
        Ok(self.roots.iter().filter(|f| f.name == name).cloned().collect())
    }

    async fn list_children(
        &self,
        folder_id: &str,
        _page_token: Option<String>,
    ) -> BridgeResult<(Vec<RemoteFile>, Option<String>)> {
        if self.failing_listings.contains(folder_id) {
            return Err(BridgeError::OperationFailed("HTTP 503".to_string()));
        }
        let mut children = self.children.get(folder_id).cloned().unwrap_or_default();
        // Mirror orderBy=folder,name
        children.sort_by(|a, b| b.is_folder.cmp(&a.is_folder).then(a.name.cmp(&b.name)));
        Ok((children, None))
    }

    async fn download(&self, file_id: &str) -> BridgeResult<ByteStream> {
        if self.failing_downloads.contains(file_id) {
            return Err(BridgeError::OperationFailed("download interrupted".to_string()));
        }
        let data = self
            .contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| BridgeError::OperationFailed(format!("File not found: {}", file_id)))?;
        Ok(Box::new(std::io::Cursor::new(data)))
    }
}

/// Photo library recording every call
#[derive(Default)]
struct FakePhotos {
    uploads: Mutex<Vec<(String, Bytes)>>,
    albums: Mutex<Vec<RemoteAlbum>>,
    media_items: Mutex<Vec<(String, String)>>,
    failing_uploads: HashSet<String>,
}

impl FakePhotos {
    fn call_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
            + self.albums.lock().unwrap().len()
            + self.media_items.lock().unwrap().len()
    }

    fn album_titles(&self) -> Vec<String> {
        self.albums
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.title.clone())
            .collect()
    }

    fn items_in(&self, title: &str) -> Vec<String> {
        let albums = self.albums.lock().unwrap();
        self.media_items
            .lock()
            .unwrap()
            .iter()
            .filter(|(album_id, _)| albums.iter().any(|a| &a.id == album_id && a.title == title))
            .map(|(_, name)| name.clone())
            .collect()
    }
}

#[async_trait]
impl PhotoLibrary for FakePhotos {
    async fn upload_bytes(&self, file_name: &str, data: Bytes) -> BridgeResult<UploadToken> {
        if self.failing_uploads.contains(file_name) {
            return Err(BridgeError::OperationFailed(
                "Google Photos API error (status 500): backend error".to_string(),
            ));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((file_name.to_string(), data));
        Ok(UploadToken::new(format!("token-{}", file_name)))
    }

    async fn create_album(&self, title: &str) -> BridgeResult<RemoteAlbum> {
        let mut albums = self.albums.lock().unwrap();
        let album = RemoteAlbum {
            id: format!("album-{}", albums.len() + 1),
            title: title.to_string(),
        };
        albums.push(album.clone());
        Ok(album)
    }

    async fn create_media_item(
        &self,
        album_id: &str,
        upload_token: &UploadToken,
        file_name: &str,
    ) -> BridgeResult<String> {
        assert_eq!(upload_token.as_str(), format!("token-{}", file_name));
        let mut items = self.media_items.lock().unwrap();
        items.push((album_id.to_string(), file_name.to_string()));
        Ok(format!("media-{}", items.len()))
    }
}

/// Probe returning a fixed answer and remembering what it saw
struct FakeProbe {
    duration: Option<Duration>,
    seen: Mutex<Vec<PathBuf>>,
}

impl FakeProbe {
    fn returning(duration: Option<Duration>) -> Self {
        Self {
            duration,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DurationProbe for FakeProbe {
    async fn probe(&self, path: &Path) -> Result<Option<Duration>, MetadataError> {
        assert!(path.exists(), "probe must see the downloaded file");
        self.seen.lock().unwrap().push(path.to_path_buf());
        Ok(self.duration)
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Harness {
    drive: Arc<FakeDrive>,
    photos: Arc<FakePhotos>,
    probe: Arc<FakeProbe>,
    temp_dir: PathBuf,
    missed_log: PathBuf,
}

impl Harness {
    fn new(drive: FakeDrive, photos: FakePhotos) -> Self {
        let base = std::env::temp_dir().join(format!("core-sync-it-{}", uuid::Uuid::new_v4()));
        Self {
            drive: Arc::new(drive),
            photos: Arc::new(photos),
            probe: Arc::new(FakeProbe::returning(None)),
            temp_dir: base.join("downloads"),
            missed_log: base.join("missed.txt"),
        }
    }

    fn with_probe(mut self, probe: FakeProbe) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    fn coordinator(&self, max_video_seconds: Option<u64>) -> SyncCoordinator {
        self.coordinator_with_library(max_video_seconds, self.photos.clone())
    }

    fn coordinator_with_library(
        &self,
        max_video_seconds: Option<u64>,
        library: Arc<dyn PhotoLibrary>,
    ) -> SyncCoordinator {
        let settings = SyncSettings::builder()
            .temp_dir(&self.temp_dir)
            .max_video_seconds_opt(max_video_seconds)
            .missed_log_path(&self.missed_log)
            .build()
            .unwrap();

        let context = SyncContext::builder(settings)
            .storage(self.drive.clone())
            .library(library)
            .probe(self.probe.clone())
            .build()
            .unwrap();

        SyncCoordinator::new(context)
    }

    fn scratch_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.temp_dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn missed_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.missed_log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(base) = self.temp_dir.parent() {
            let _ = std::fs::remove_dir_all(base);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_trip2023_photo_uploaded_long_clip_skipped() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "p1", "photo.jpg", None);
    drive.add_file("root", "v1", "clip.mp4", Some(400_000));
    let harness = Harness::new(drive, FakePhotos::default());

    let report = harness.coordinator(Some(300)).run("Trip2023").await.unwrap();

    assert_eq!(report.uploaded(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 0);
    assert!(report.is_clean());

    let clip = report
        .records()
        .iter()
        .find(|r| r.file_name == "clip.mp4")
        .unwrap();
    assert_eq!(
        clip.result,
        TransferResult::SkippedDurationExceeded {
            duration: Duration::from_secs(400)
        }
    );

    assert_eq!(harness.photos.album_titles(), vec!["Trip2023"]);
    assert_eq!(harness.photos.items_in("Trip2023"), vec!["photo.jpg"]);

    let uploads = harness.photos.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, Bytes::from_static(b"p1"));
}

#[tokio::test]
async fn test_unknown_root_fails_without_upload_calls() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "p1", "photo.jpg", None);
    let harness = Harness::new(drive, FakePhotos::default());

    let result = harness.coordinator(None).run("Holiday").await;

    assert!(matches!(result, Err(SyncError::RootFolderNotFound { ref name }) if name == "Holiday"));
    assert!(result.unwrap_err().is_fatal());
    assert_eq!(harness.photos.call_count(), 0);
}

#[tokio::test]
async fn test_ambiguous_root_fails() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.roots.push(folder("root2", "Trip2023"));
    let harness = Harness::new(drive, FakePhotos::default());

    let result = harness.coordinator(None).run("Trip2023").await;

    assert!(matches!(result, Err(SyncError::RootFolderAmbiguous { count: 2, .. })));
    assert_eq!(harness.photos.call_count(), 0);
}

#[tokio::test]
async fn test_failure_does_not_stop_later_files() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "a", "a.jpg", None);
    drive.add_file("root", "b", "b.jpg", None);
    drive.add_file("root", "c", "c.jpg", None);
    drive.add_file("root", "d", "d.jpg", None);
    drive.failing_downloads.insert("c".to_string());

    let photos = FakePhotos {
        failing_uploads: HashSet::from(["b.jpg".to_string()]),
        ..Default::default()
    };
    let harness = Harness::new(drive, photos);

    let report = harness.coordinator(None).run("Trip2023").await.unwrap();

    let outcomes: Vec<(&str, bool)> = report
        .records()
        .iter()
        .map(|r| (r.file_name.as_str(), r.result.is_uploaded()))
        .collect();
    assert_eq!(
        outcomes,
        vec![("a.jpg", true), ("b.jpg", false), ("c.jpg", false), ("d.jpg", true)]
    );
    assert_eq!(report.failed(), 2);
    assert!(report.to_string().contains("failed: Trip2023/c.jpg"));
    assert_eq!(harness.photos.items_in("Trip2023"), vec!["a.jpg", "d.jpg"]);

    let reasons: Vec<String> = report
        .failures()
        .filter_map(|r| r.result.missed_reason())
        .collect();
    assert!(reasons[0].starts_with("upload failed:"), "{}", reasons[0]);
    assert!(reasons[1].starts_with("download failed:"), "{}", reasons[1]);
}

#[tokio::test]
async fn test_scratch_files_removed_after_success_and_failure() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "a", "a.jpg", None);
    drive.add_file("root", "b", "b.png", None);
    let photos = FakePhotos {
        failing_uploads: HashSet::from(["b.png".to_string()]),
        ..Default::default()
    };
    let harness = Harness::new(drive, photos);

    let report = harness.coordinator(None).run("Trip2023").await.unwrap();

    assert_eq!(report.uploaded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(harness.temp_dir.exists());
    assert!(harness.scratch_files().is_empty());
}

#[tokio::test]
async fn test_one_album_per_folder_in_depth_first_order() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "r1", "cover.jpg", None);
    drive.add_folder("root", "d1", "Day1");
    drive.add_folder("root", "d2", "Day2");
    drive.add_file("d1", "f1", "beach.jpg", None);
    drive.add_file("d1", "f2", "sunset.heic", None);
    drive.add_file("d2", "f3", "museum.png", None);
    let harness = Harness::new(drive, FakePhotos::default());

    let report = harness.coordinator(None).run("Trip2023").await.unwrap();

    assert_eq!(report.uploaded(), 4);
    assert_eq!(report.albums_created(), 3);
    assert_eq!(harness.photos.album_titles(), vec!["Trip2023", "Day1", "Day2"]);
    assert_eq!(harness.photos.items_in("Day1"), vec!["beach.jpg", "sunset.heic"]);
    assert_eq!(harness.photos.items_in("Day2"), vec!["museum.png"]);

    let folders: Vec<String> = report.records().iter().map(|r| r.folder.to_string()).collect();
    assert_eq!(
        folders,
        vec!["Trip2023", "Trip2023/Day1", "Trip2023/Day1", "Trip2023/Day2"]
    );
}

#[tokio::test]
async fn test_folder_without_media_creates_no_album() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_folder("root", "d1", "Docs");
    drive.add_file("d1", "t1", "notes.txt", None);
    let harness = Harness::new(drive, FakePhotos::default());

    let report = harness.coordinator(None).run("Trip2023").await.unwrap();

    assert_eq!(report.skipped(), 1);
    assert_eq!(harness.photos.call_count(), 0);
}

#[tokio::test]
async fn test_rerun_creates_duplicate_album() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "p1", "photo.jpg", None);
    let harness = Harness::new(drive, FakePhotos::default());

    harness.coordinator(None).run("Trip2023").await.unwrap();
    harness.coordinator(None).run("Trip2023").await.unwrap();

    let albums = harness.photos.albums.lock().unwrap().clone();
    assert_eq!(albums.len(), 2);
    assert_eq!(albums[0].title, albums[1].title);
    assert_ne!(albums[0].id, albums[1].id);
}

#[tokio::test]
async fn test_unknown_duration_probed_after_download() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "v1", "long.mkv", None);
    let harness = Harness::new(drive, FakePhotos::default())
        .with_probe(FakeProbe::returning(Some(Duration::from_secs(301))));

    let report = harness.coordinator(Some(300)).run("Trip2023").await.unwrap();

    assert_eq!(report.skipped(), 1);
    assert_eq!(harness.probe.seen.lock().unwrap().len(), 1);
    assert_eq!(harness.photos.call_count(), 0);
    assert!(harness.scratch_files().is_empty());
}

#[tokio::test]
async fn test_unresolved_probe_accepts_video() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "v1", "clip.avi", None);
    let harness = Harness::new(drive, FakePhotos::default());

    let report = harness.coordinator(Some(300)).run("Trip2023").await.unwrap();

    assert_eq!(report.uploaded(), 1);
    assert_eq!(harness.probe.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_no_limit_skips_probe() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "v1", "clip.mov", None);
    drive.add_file("root", "v2", "movie.mp4", Some(7_200_000));
    let harness = Harness::new(drive, FakePhotos::default());

    let report = harness.coordinator(None).run("Trip2023").await.unwrap();

    assert_eq!(report.uploaded(), 2);
    assert!(harness.probe.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missed_files_log_lines() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_folder("root", "d1", "Day1");
    drive.add_file("d1", "t1", "notes.txt", None);
    drive.add_file("d1", "v1", "clip.mp4", Some(400_000));
    drive.add_file("d1", "p1", "photo.jpg", None);
    let harness = Harness::new(drive, FakePhotos::default());

    harness.coordinator(Some(300)).run("Trip2023").await.unwrap();

    assert_eq!(
        harness.missed_lines(),
        vec![
            "Trip2023/Day1 - clip.mp4 : too long (400.0s)",
            "Trip2023/Day1 - notes.txt : unsupported",
        ]
    );
}

#[tokio::test]
async fn test_listing_error_keeps_earlier_results() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "p1", "photo.jpg", None);
    drive.add_folder("root", "d1", "Day1");
    drive.add_file("d1", "p2", "beach.jpg", None);
    drive.failing_listings.insert("d1".to_string());
    let harness = Harness::new(drive, FakePhotos::default());

    let report = harness.coordinator(None).run("Trip2023").await.unwrap();

    assert_eq!(report.uploaded(), 1);
    assert!(report.listing_error().unwrap().contains("HTTP 503"));
    assert!(!report.is_clean());
}

/// Credential source whose refresh token was revoked
struct RevokedCredentials;

#[async_trait]
impl CredentialProvider for RevokedCredentials {
    async fn obtain(&self) -> Result<OAuthTokens, AuthError> {
        Err(AuthError::TokenRefreshFailed("invalid_grant".to_string()))
    }
}

/// HTTP client that must never be reached
struct UnreachableHttp;

#[async_trait]
impl HttpClient for UnreachableHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        panic!("unexpected request to {}", request.url);
    }

    async fn download_stream(&self, request: HttpRequest) -> BridgeResult<ByteStream> {
        panic!("unexpected download of {}", request.url);
    }
}

#[tokio::test]
async fn test_expired_credentials_abort_run() {
    let mut drive = FakeDrive::with_root("Trip2023");
    drive.add_file("root", "p1", "a.jpg", None);
    drive.add_file("root", "p2", "b.jpg", None);
    let harness = Harness::new(drive, FakePhotos::default());

    let expired = OAuthTokens::new("ya29.expired".into(), Some("1//revoked".into()), -1);
    let tokens = Arc::new(SharedAccessToken::with_tokens(
        Arc::new(RevokedCredentials),
        expired,
    ));
    let library = Arc::new(GooglePhotosConnector::new(Arc::new(UnreachableHttp), tokens));

    let result = harness
        .coordinator_with_library(None, library)
        .run("Trip2023")
        .await;

    assert!(
        matches!(result, Err(SyncError::Auth(ref e)) if e.to_string().contains("invalid_grant")),
        "{:?}",
        result.as_ref().map(|r| r.to_string())
    );
    assert!(harness.missed_lines().is_empty());
    assert!(harness.scratch_files().is_empty());
}
