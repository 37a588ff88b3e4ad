//! Hosted object storage client.
//!
//! Speaks the Firebase Storage REST dialect: media upload with a
//! `name` query parameter, token-based public download URLs, and
//! simple object deletion.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::{StorageError, StorageResult};

/// Bound on downloads performed through this client (trimmed clips,
/// audio tracks). Generous because source media can be large.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the hosted object storage bucket.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "downloadTokens", default)]
    download_tokens: Option<String>,
}

impl StorageClient {
    pub fn new(http: reqwest::Client, bucket: impl Into<String>) -> Self {
        Self {
            http,
            base_url: "https://firebasestorage.googleapis.com".to_string(),
            bucket: bucket.into(),
        }
    }

    /// Override the service base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn object_url(&self, object_path: &str) -> String {
        format!(
            "{}/v0/b/{}/o/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(object_path)
        )
    }

    /// Upload a local video and return its public download URL.
    pub async fn upload_video(&self, local: &Path, object_path: &str) -> StorageResult<String> {
        let bytes = tokio::fs::read(local).await?;
        let size = bytes.len();

        let url = format!(
            "{}/v0/b/{}/o?uploadType=media&name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(object_path)
        );
        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "video/mp4")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StorageError::http(status.as_u16(), message));
        }

        let body: UploadResponse = resp.json().await?;
        let token = body
            .download_tokens
            .and_then(|t| t.split(',').next().map(str::to_string))
            .filter(|t| !t.is_empty())
            .ok_or(StorageError::MissingToken)?;

        let download_url = format!("{}?alt=media&token={}", self.object_url(object_path), token);
        info!(
            object_path,
            size_mb = size as f64 / (1024.0 * 1024.0),
            "Uploaded video to storage"
        );
        Ok(download_url)
    }

    /// Download any URL (storage object or external media) to a local
    /// file.
    pub async fn download(&self, url: &str, local: &Path) -> StorageResult<()> {
        vidgen_media::download_to_file(&self.http, url, local, DOWNLOAD_TIMEOUT).await?;
        Ok(())
    }

    /// Delete an object from the bucket.
    pub async fn delete(&self, object_path: &str) -> StorageResult<()> {
        let resp = self.http.delete(self.object_url(object_path)).send().await?;
        let status = resp.status();
        if status.is_success() || status.as_u16() == 404 {
            // Already-gone objects count as deleted
            Ok(())
        } else {
            let message = resp.text().await.unwrap_or_default();
            Err(StorageError::http(status.as_u16(), message))
        }
    }
}

/// Extract the bucket object path from a token download URL, if the
/// URL points at this storage dialect.
pub fn object_path_from_url(url: &str) -> Option<String> {
    let (_, after) = url.split_once("/o/")?;
    let encoded = after.split(['?', '#']).next()?;
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> StorageClient {
        StorageClient::new(reqwest::Client::new(), "test-bucket")
            .with_base_url(server.uri())
    }

    #[test]
    fn test_object_path_from_url() {
        assert_eq!(
            object_path_from_url(
                "https://firebasestorage.googleapis.com/v0/b/b1/o/videos%2Ftrimmed_1.mp4?alt=media&token=t"
            )
            .as_deref(),
            Some("videos/trimmed_1.mp4")
        );
        assert_eq!(object_path_from_url("https://cdn.example.com/a.mp3"), None);
    }

    #[tokio::test]
    async fn test_upload_returns_token_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v0/b/test-bucket/o"))
            .and(query_param("name", "videos/clip.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "downloadTokens": "tok-1" })),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let local = dir.path().join("clip.mp4");
        std::fs::write(&local, b"mp4").unwrap();

        let url = client(&server)
            .upload_video(&local, "videos/clip.mp4")
            .await
            .unwrap();
        assert!(url.contains("videos%2Fclip.mp4"));
        assert!(url.ends_with("alt=media&token=tok-1"));
    }

    #[tokio::test]
    async fn test_upload_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v0/b/test-bucket/o"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let local = dir.path().join("clip.mp4");
        std::fs::write(&local, b"mp4").unwrap();

        let err = client(&server)
            .upload_video(&local, "videos/clip.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingToken));
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_object() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        client(&server).delete("videos/gone.mp4").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_surfaces_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).delete("videos/clip.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::Http { status: 500, .. }));
    }
}
