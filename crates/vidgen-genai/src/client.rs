//! Generation task client: submit, poll, fetch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GenError, GenResult};
use crate::retry::{retry_with_backoff, RetryConfig};

/// Opaque identifier for one in-flight generation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a finished generation result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Polling state of a generation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Still queued or rendering.
    Pending,
    /// Finished; the result file is ready to fetch.
    Success(FileId),
    /// Terminal failure reported by the service.
    Failed(String),
}

/// Generation client configuration.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Service base URL (overridable for tests).
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Image-to-video model name.
    pub model: String,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Maximum number of status polls before giving up.
    pub max_poll_attempts: u32,
    /// Bound on the result media transfer.
    pub download_timeout: Duration,
    /// Retry policy for submit/retrieve calls.
    pub retry: RetryConfig,
}

impl GenerationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.minimaxi.chat".to_string(),
            api_key: api_key.into(),
            model: "I2V-01".to_string(),
            poll_interval: Duration::from_secs(10),
            // 90 polls at the default interval bounds a task at 15 minutes.
            max_poll_attempts: 90,
            download_timeout: Duration::from_secs(300),
            retry: RetryConfig::new("generation_api"),
        }
    }
}

/// Client for the asynchronous image-to-video generation service.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    model: &'a str,
    first_frame_image: String,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    file_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    file: Option<RetrieveFile>,
}

#[derive(Debug, Deserialize)]
struct RetrieveFile {
    #[serde(default)]
    download_url: Option<String>,
}

impl GenerationClient {
    pub fn new(http: reqwest::Client, config: GenerationConfig) -> Self {
        Self { http, config }
    }

    /// Submit a still frame plus prompt; returns the task handle.
    ///
    /// The image travels inline as a base64 data URL, matching the
    /// service's first-frame contract.
    pub async fn submit(&self, image: &Path, prompt: &str) -> GenResult<TaskId> {
        let bytes = tokio::fs::read(image).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let first_frame_image = format!("data:image/jpeg;base64,{encoded}");

        let url = format!("{}/v1/video_generation", self.config.base_url);
        let response: SubmitResponse = retry_with_backoff(&self.config.retry, || {
            // Each attempt gets its own copy; the closure must stay
            // callable after the future it returned has consumed one.
            let url = url.clone();
            let payload = SubmitRequest {
                model: &self.config.model,
                first_frame_image: first_frame_image.clone(),
                prompt,
            };
            async move {
                let resp = self
                    .http
                    .post(&url)
                    .bearer_auth(&self.config.api_key)
                    .json(&payload)
                    .send()
                    .await?;
                Self::check_status(resp).await?.json().await.map_err(GenError::from)
            }
        })
        .await?;

        match response.task_id {
            Some(task_id) if !task_id.is_empty() => {
                info!(%task_id, "Submitted generation task");
                Ok(TaskId(task_id))
            }
            _ => Err(GenError::Submission(
                "response did not contain a task id".to_string(),
            )),
        }
    }

    /// Query the current status of a task, once.
    pub async fn query(&self, task_id: &TaskId) -> GenResult<TaskStatus> {
        let url = format!(
            "{}/v1/query/video_generation?task_id={}",
            self.config.base_url,
            urlencoding::encode(task_id.as_str())
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;
        let body: QueryResponse = Self::check_status(resp).await?.json().await?;
        Ok(parse_task_status(&body.status, body.file_id))
    }

    /// Poll a task until it reaches a terminal state, bounded by the
    /// configured attempt cap.
    ///
    /// Transient poll failures consume an attempt and do not abort the
    /// wait; a permanent rejection does.
    pub async fn await_completion(&self, task_id: &TaskId) -> GenResult<FileId> {
        use crate::retry::RetryClass;

        for attempt in 1..=self.config.max_poll_attempts {
            tokio::time::sleep(self.config.poll_interval).await;

            match self.query(task_id).await {
                Ok(TaskStatus::Success(file_id)) => {
                    info!(%task_id, %file_id, attempt, "Generation task finished");
                    return Ok(file_id);
                }
                Ok(TaskStatus::Failed(reason)) => {
                    return Err(GenError::GenerationFailed(reason));
                }
                Ok(TaskStatus::Pending) => {}
                Err(e) if e.is_permanent() => return Err(e),
                Err(e) => {
                    warn!(%task_id, attempt, "Status poll failed, will retry: {}", e);
                }
            }
        }

        Err(GenError::GenerationTimeout {
            attempts: self.config.max_poll_attempts,
        })
    }

    /// Resolve the short-lived download URL for a finished file and
    /// stream the payload to disk.
    pub async fn fetch(&self, file_id: &FileId, output: &Path) -> GenResult<PathBuf> {
        let url = format!(
            "{}/v1/files/retrieve?file_id={}",
            self.config.base_url,
            urlencoding::encode(file_id.as_str())
        );
        let response: RetrieveResponse = retry_with_backoff(&self.config.retry, || async {
            let resp = self
                .http
                .get(&url)
                .bearer_auth(&self.config.api_key)
                .send()
                .await?;
            Self::check_status(resp).await?.json().await.map_err(GenError::from)
        })
        .await?;

        let download_url = response
            .file
            .and_then(|f| f.download_url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                GenError::Retrieval(format!("no download URL for file {file_id}"))
            })?;

        vidgen_media::download_to_file(
            &self.http,
            &download_url,
            output,
            self.config.download_timeout,
        )
        .await?;

        Ok(output.to_path_buf())
    }

    /// Map a non-success HTTP status to the taxonomy, keeping the body
    /// text for diagnostics.
    async fn check_status(resp: reqwest::Response) -> GenResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let message = resp.text().await.unwrap_or_default();
            Err(GenError::http(status.as_u16(), message))
        }
    }
}

/// Map the service's wire status strings to [`TaskStatus`].
///
/// Anything that is not terminal ("Preparing", "Queueing",
/// "Processing", unknown strings) counts as pending.
fn parse_task_status(status: &str, file_id: Option<String>) -> TaskStatus {
    match status {
        "Success" => match file_id.filter(|f| !f.is_empty()) {
            Some(file_id) => TaskStatus::Success(FileId(file_id)),
            None => TaskStatus::Failed("success reported without a file id".to_string()),
        },
        "Fail" | "Failed" => TaskStatus::Failed("generation task reported failure".to_string()),
        _ => TaskStatus::Pending,
    }
}
