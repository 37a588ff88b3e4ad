//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{complete_video, generation_status, health, process_video};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/process-video", post(process_video))
        .route("/complete-video", post(complete_video))
        .route("/generation-status/:task_id", get(generation_status));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health))
        // The body limit bounds the source video upload. Axum's own
        // 2MB default still gates the multipart extractor, so it has
        // to be raised to the same bound explicitly.
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

pub(crate) fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_methods = [Method::GET, Method::POST, Method::OPTIONS];
    let allowed_headers = [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
            .allow_origin(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::ApiConfig;
    use crate::state::AppState;

    fn test_router(scratch: &TempDir) -> Router {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            max_body_size: 10 * 1024 * 1024,
            scratch_dir: scratch.path().to_path_buf(),
            minimax_api_key: "test-key".to_string(),
            firebase_project_id: "test-project".to_string(),
            firebase_storage_bucket: "test-bucket".to_string(),
        };
        create_router(AppState::new(config).unwrap())
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_healthy() {
        let scratch = TempDir::new().unwrap();
        let response = test_router(&scratch)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("healthy"));
    }

    #[tokio::test]
    async fn test_process_video_rejects_short_clip_length() {
        let scratch = TempDir::new().unwrap();
        let boundary = "test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"clipLength\"\r\n\r\n\
             0.05\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"prompt\"\r\n\r\n\
             a cat walking\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"originalVideo\"; filename=\"v.mp4\"\r\n\
             Content-Type: video/mp4\r\n\r\n\
             not-a-real-video\r\n\
             --{boundary}--\r\n"
        );

        let response = test_router(&scratch)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/process-video")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("clipLength"));
    }

    #[tokio::test]
    async fn test_process_video_accepts_bodies_over_two_megabytes() {
        let scratch = TempDir::new().unwrap();
        let boundary = "test-boundary";
        // Realistic source videos are far bigger than axum's built-in
        // 2MB extractor default; the request must reach validation
        // instead of dying in the multipart parser.
        let video = vec![0u8; 3 * 1024 * 1024];
        let mut body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"clipLength\"\r\n\r\n\
             0.05\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"prompt\"\r\n\r\n\
             a cat walking\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"originalVideo\"; filename=\"v.mp4\"\r\n\
             Content-Type: video/mp4\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(&video);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let response = test_router(&scratch)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/process-video")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        // The oversized body parsed fine; the clipLength check fired
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let text = body_string(response).await;
        assert!(text.contains("clipLength"), "unexpected body: {text}");
        assert!(!text.contains("multipart"), "unexpected body: {text}");
    }

    #[tokio::test]
    async fn test_process_video_requires_video_field() {
        let scratch = TempDir::new().unwrap();
        let boundary = "test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"clipLength\"\r\n\r\n\
             3\r\n\
             --{boundary}--\r\n"
        );

        let response = test_router(&scratch)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/process-video")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("originalVideo"));
    }

    #[tokio::test]
    async fn test_complete_video_rejects_invalid_params() {
        let scratch = TempDir::new().unwrap();
        let payload = serde_json::json!({
            "aiVideoFileId": "",
            "audioUrl": "https://cdn.test/audio.mp3",
            "trimmedVideo": "https://cdn.test/trimmed.mp4",
            "clipLength": 3.0,
            "doubleGeneration": false,
            "generationType": "ai",
        });

        let response = test_router(&scratch)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/complete-video")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("aiVideoFileId"));
    }
}
