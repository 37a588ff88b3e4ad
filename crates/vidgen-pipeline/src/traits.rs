//! Collaborator traits.
//!
//! The orchestrator takes every external dependency as an injected
//! trait object so tests can substitute fakes for ffmpeg, the
//! generation service, and the storage backends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use vidgen_genai::{FileId, GenResult, GenerationClient, TaskId};
use vidgen_media::{MediaResult, StageExecutor, StageResult};
use vidgen_storage::{DocumentWriter, StorageClient, StorageResult};

/// The five transcode stages.
#[async_trait]
pub trait VideoStages: Send + Sync {
    async fn trim(&self, input: &Path, output: &Path, clip_len: f64) -> MediaResult<StageResult>;

    async fn extract_last_frame(&self, input: &Path, output: &Path) -> MediaResult<PathBuf>;

    async fn reverse(&self, input: &Path, output: &Path) -> MediaResult<StageResult>;

    async fn concat_merge(
        &self,
        first: &Path,
        second: &Path,
        output: &Path,
    ) -> MediaResult<StageResult>;

    async fn audio_mix(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        target_len: f64,
    ) -> MediaResult<StageResult>;
}

#[async_trait]
impl VideoStages for StageExecutor {
    async fn trim(&self, input: &Path, output: &Path, clip_len: f64) -> MediaResult<StageResult> {
        StageExecutor::trim(self, input, output, clip_len).await
    }

    async fn extract_last_frame(&self, input: &Path, output: &Path) -> MediaResult<PathBuf> {
        StageExecutor::extract_last_frame(self, input, output).await
    }

    async fn reverse(&self, input: &Path, output: &Path) -> MediaResult<StageResult> {
        StageExecutor::reverse(self, input, output).await
    }

    async fn concat_merge(
        &self,
        first: &Path,
        second: &Path,
        output: &Path,
    ) -> MediaResult<StageResult> {
        StageExecutor::concat_merge(self, first, second, output).await
    }

    async fn audio_mix(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        target_len: f64,
    ) -> MediaResult<StageResult> {
        StageExecutor::audio_mix(self, video, audio, output, target_len).await
    }
}

/// Submission and retrieval against the generation service.
///
/// Polling is not part of this seam: the initiate phase returns right
/// after submission and the complete phase receives a finished file
/// id, so the orchestrator never waits on a task itself.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn submit(&self, image: &Path, prompt: &str) -> GenResult<TaskId>;

    async fn fetch(&self, file_id: &FileId, output: &Path) -> GenResult<PathBuf>;
}

#[async_trait]
impl Generator for GenerationClient {
    async fn submit(&self, image: &Path, prompt: &str) -> GenResult<TaskId> {
        GenerationClient::submit(self, image, prompt).await
    }

    async fn fetch(&self, file_id: &FileId, output: &Path) -> GenResult<PathBuf> {
        GenerationClient::fetch(self, file_id, output).await
    }
}

/// Object storage: upload, download, delete.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload_video(&self, local: &Path, object_path: &str) -> StorageResult<String>;

    async fn download(&self, url: &str, local: &Path) -> StorageResult<()>;

    async fn delete(&self, object_path: &str) -> StorageResult<()>;
}

#[async_trait]
impl MediaStore for StorageClient {
    async fn upload_video(&self, local: &Path, object_path: &str) -> StorageResult<String> {
        StorageClient::upload_video(self, local, object_path).await
    }

    async fn download(&self, url: &str, local: &Path) -> StorageResult<()> {
        StorageClient::download(self, url, local).await
    }

    async fn delete(&self, object_path: &str) -> StorageResult<()> {
        StorageClient::delete(self, object_path).await
    }
}

/// Metadata and error-log writes.
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn record_video(
        &self,
        download_url: &str,
        title: &str,
        generation_type: &str,
    ) -> StorageResult<()>;

    async fn log_error(
        &self,
        function_name: &str,
        message: &str,
        detail: Value,
    ) -> StorageResult<()>;
}

#[async_trait]
impl EventLog for DocumentWriter {
    async fn record_video(
        &self,
        download_url: &str,
        title: &str,
        generation_type: &str,
    ) -> StorageResult<()> {
        DocumentWriter::record_video(self, download_url, title, generation_type).await
    }

    async fn log_error(
        &self,
        function_name: &str,
        message: &str,
        detail: Value,
    ) -> StorageResult<()> {
        DocumentWriter::log_error(self, function_name, message, detail).await
    }
}
