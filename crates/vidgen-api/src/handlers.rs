//! Request handlers.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use vidgen_genai::{GenError, TaskId, TaskStatus};
use vidgen_models::{CompleteParams, InitiateParams, JobId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct ProcessVideoResponse {
    pub status: String,
    pub task_id: String,
    pub trimmed_video: String,
}

/// Phase A: accept the source video, trim it, submit its last frame
/// for generation, and return the task handle without waiting.
///
/// Multipart fields: `originalVideo` (file), `clipLength`, `prompt`,
/// `generationType` (optional).
pub async fn process_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProcessVideoResponse>> {
    let mut video_bytes = None;
    let mut clip_length = None;
    let mut prompt = None;
    let mut generation_type = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("originalVideo") => video_bytes = Some(field.bytes().await?),
            Some("clipLength") => clip_length = Some(field.text().await?),
            Some("prompt") => prompt = Some(field.text().await?),
            Some("generationType") => generation_type = Some(field.text().await?),
            _ => {}
        }
    }

    let video_bytes = video_bytes
        .ok_or_else(|| ApiError::bad_request("originalVideo: file field is required"))?;
    let clip_length: f64 = clip_length
        .ok_or_else(|| ApiError::bad_request("clipLength: field is required"))?
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("clipLength: must be a number"))?;
    let params = InitiateParams {
        clip_length,
        prompt: prompt.unwrap_or_default(),
        generation_type: generation_type.unwrap_or_else(|| "unknown".to_string()),
    };

    // Persist the upload under the job's namespace; the job takes
    // ownership of the file and removes it with the other artifacts.
    // The id allocation is collision-proof, so two requests landing in
    // the same millisecond still get distinct paths.
    let job = JobId::next();
    let upload_path = state.registry.scratch_path("upload", job, "mp4");
    tokio::fs::write(&upload_path, &video_bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {e}")))?;
    info!(
        %job,
        size = video_bytes.len(),
        path = %upload_path.display(),
        "Received source video"
    );

    let outcome = state.pipeline.initiate(job, upload_path, params).await?;

    Ok(Json(ProcessVideoResponse {
        status: "success".to_string(),
        task_id: outcome.task_id.to_string(),
        trimmed_video: outcome.trimmed_video_url,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteVideoResponse {
    pub success: bool,
    pub video_url: String,
}

/// Phase B: fetch the generated clip, compose it with the trimmed
/// clip and background audio, and publish the result.
pub async fn complete_video(
    State(state): State<AppState>,
    Json(params): Json<CompleteParams>,
) -> ApiResult<Json<CompleteVideoResponse>> {
    let outcome = state.pipeline.complete(params).await?;

    Ok(Json(CompleteVideoResponse {
        success: true,
        video_url: outcome.video_url,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Single status poll for a generation task, for client-driven
/// polling between the two phases.
pub async fn generation_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<GenerationStatusResponse>> {
    let status = state
        .generator
        .query(&TaskId(task_id))
        .await
        .map_err(task_query_error)?;

    let response = match status {
        TaskStatus::Pending => GenerationStatusResponse {
            status: "processing".to_string(),
            file_id: None,
            error: None,
        },
        TaskStatus::Success(file_id) => GenerationStatusResponse {
            status: "success".to_string(),
            file_id: Some(file_id.to_string()),
            error: None,
        },
        TaskStatus::Failed(reason) => GenerationStatusResponse {
            status: "failed".to_string(),
            file_id: None,
            error: Some(reason),
        },
    };
    Ok(Json(response))
}

/// On this read-only probe a 4xx from the generation service means
/// the caller asked about a task that does not exist (or asked
/// malformedly), not that we are broken.
fn task_query_error(e: GenError) -> ApiError {
    match e {
        GenError::Http { status, .. } if (400..500).contains(&status) => {
            ApiError::bad_request(format!("Unknown or invalid task id (service status {status})"))
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_query_maps_client_rejection_to_bad_request() {
        let err = task_query_error(GenError::http(404, "task not found"));
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_task_query_keeps_service_faults_internal() {
        let err = task_query_error(GenError::http(503, "unavailable"));
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
