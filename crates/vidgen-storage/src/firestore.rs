//! Metadata document writer.
//!
//! Writes two kinds of documents over the Firestore REST dialect: a
//! feed record for every published video, and an entry in the `errors`
//! collection carrying full diagnostic detail for failed jobs.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{StorageError, StorageResult};

/// Writer for the metadata document store.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    /// Collection that feeds the public gallery.
    feed_collection: String,
}

impl DocumentWriter {
    pub fn new(http: reqwest::Client, project_id: impl Into<String>) -> Self {
        Self {
            http,
            base_url: "https://firestore.googleapis.com".to_string(),
            project_id: project_id.into(),
            feed_collection: "generatedVideos".to_string(),
        }
    }

    /// Override the service base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, collection
        )
    }

    async fn add_document(&self, collection: &str, fields: Value) -> StorageResult<()> {
        let resp = self
            .http
            .post(self.collection_url(collection))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StorageError::http(status.as_u16(), message));
        }
        Ok(())
    }

    /// Record a published video in the feed collection.
    pub async fn record_video(
        &self,
        download_url: &str,
        title: &str,
        generation_type: &str,
    ) -> StorageResult<()> {
        self.add_document(
            &self.feed_collection,
            json!({
                "title": { "stringValue": title },
                "downloadUrl": { "stringValue": download_url },
                "generationType": { "stringValue": generation_type },
                "createdAt": { "timestampValue": Utc::now().to_rfc3339() },
            }),
        )
        .await?;
        info!(download_url, generation_type, "Recorded video in feed");
        Ok(())
    }

    /// Write a failure record with full diagnostic detail.
    pub async fn log_error(
        &self,
        function_name: &str,
        message: &str,
        detail: Value,
    ) -> StorageResult<()> {
        self.add_document(
            "errors",
            json!({
                "functionName": { "stringValue": function_name },
                "message": { "stringValue": message },
                "additionalData": { "stringValue": detail.to_string() },
                "timestamp": { "timestampValue": Utc::now().to_rfc3339() },
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn writer(server: &MockServer) -> DocumentWriter {
        DocumentWriter::new(reqwest::Client::new(), "test-project")
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_record_video_writes_feed_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/test-project/databases/(default)/documents/generatedVideos",
            ))
            .and(body_partial_json(serde_json::json!({
                "fields": {
                    "downloadUrl": { "stringValue": "https://cdn/video.mp4" },
                    "generationType": { "stringValue": "ai" },
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        writer(&server)
            .record_video("https://cdn/video.mp4", "Generated video", "ai")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_log_error_targets_errors_collection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/test-project/databases/(default)/documents/errors",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        writer(&server)
            .log_error(
                "complete",
                "stage failed",
                serde_json::json!({ "jobId": 1234 }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_server_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = writer(&server)
            .record_video("https://cdn/v.mp4", "t", "ai")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Http { status: 503, .. }));
    }
}
