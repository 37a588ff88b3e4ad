//! The two pipeline phases.
//!
//! Within one job the stages are strictly sequential: each stage's
//! output path is the next stage's input. Jobs run concurrently with
//! each other; isolation comes from the job-id namespacing of every
//! temp path, never from serialization.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};

use vidgen_genai::{FileId, TaskId};
use vidgen_models::{CompleteParams, InitiateParams, JobId};
use vidgen_storage::client::object_path_from_url;

use crate::artifacts::ArtifactRegistry;
use crate::error::{PipelineError, PipelineResult};
use crate::notify::Notifier;
use crate::traits::{EventLog, Generator, MediaStore, VideoStages};

/// Result of the initiate phase.
#[derive(Debug, Clone)]
pub struct InitiateOutcome {
    pub task_id: TaskId,
    /// Public URL of the uploaded trimmed clip, consumed by the
    /// complete phase.
    pub trimmed_video_url: String,
}

/// Result of the complete phase.
#[derive(Debug, Clone)]
pub struct CompleteOutcome {
    pub video_url: String,
}

/// Orchestrates the pipeline phases over injected collaborators.
pub struct Pipeline {
    stages: Arc<dyn VideoStages>,
    generator: Arc<dyn Generator>,
    store: Arc<dyn MediaStore>,
    events: Arc<dyn EventLog>,
    notifier: Arc<dyn Notifier>,
    registry: Arc<ArtifactRegistry>,
}

impl Pipeline {
    pub fn new(
        stages: Arc<dyn VideoStages>,
        generator: Arc<dyn Generator>,
        store: Arc<dyn MediaStore>,
        events: Arc<dyn EventLog>,
        notifier: Arc<dyn Notifier>,
        registry: Arc<ArtifactRegistry>,
    ) -> Self {
        Self {
            stages,
            generator,
            store,
            events,
            notifier,
            registry,
        }
    }

    /// The artifact registry backing this pipeline.
    pub fn registry(&self) -> &Arc<ArtifactRegistry> {
        &self.registry
    }

    /// Phase A: trim, extract last frame, submit to the generation
    /// service, upload the trimmed clip.
    ///
    /// Returns right after submission; generation takes minutes and
    /// must never block the request. The caller allocates `job` (via
    /// [`JobId::next`]) so the upload it stored before this call can
    /// already carry the job's namespace; `input` is that uploaded
    /// source video, and the job takes ownership of it and deletes it
    /// with the rest of the artifacts before returning.
    pub async fn initiate(
        &self,
        job: JobId,
        input: PathBuf,
        params: InitiateParams,
    ) -> PipelineResult<InitiateOutcome> {
        info!(%job, clip_length = params.clip_length, "Initiate phase started");

        let result = self.run_initiate(job, input, &params).await;
        self.registry.release_all(job).await;

        match &result {
            Ok(outcome) => {
                info!(%job, task_id = %outcome.task_id, "Initiate phase complete");
            }
            Err(e) => {
                self.report_failure(
                    "initiate",
                    job,
                    e,
                    json!({
                        "jobId": job,
                        "clipLength": params.clip_length,
                        "prompt": params.prompt,
                        "generationType": params.generation_type,
                    }),
                )
                .await;
            }
        }
        result
    }

    async fn run_initiate(
        &self,
        job: JobId,
        input: PathBuf,
        params: &InitiateParams,
    ) -> PipelineResult<InitiateOutcome> {
        // Register the upload before anything can fail, validation
        // included, so every exit path removes it.
        self.registry.register(input.clone(), job, "upload");
        params.validate()?;
        if !input.exists() {
            return Err(PipelineError::internal(format!(
                "input file is missing: {}",
                input.display()
            )));
        }

        let trimmed = self.registry.scratch_path("trimmed", job, "mp4");
        self.registry.register(trimmed.clone(), job, "trim");
        self.stages
            .trim(&input, &trimmed, params.clip_length)
            .await?;

        let frame = self.registry.scratch_path("last_frame", job, "jpg");
        self.registry.register(frame.clone(), job, "extract_frame");
        self.stages.extract_last_frame(&trimmed, &frame).await?;

        let task_id = self
            .generator
            .submit(&frame, params.prompt.trim())
            .await?;

        let trimmed_video_url = self
            .store
            .upload_video(&trimmed, &format!("videos/trimmed_{job}.mp4"))
            .await?;

        Ok(InitiateOutcome {
            task_id,
            trimmed_video_url,
        })
    }

    /// Phase B: fetch the generated clip, optionally double it, mix
    /// in background audio, merge with the trimmed clip, publish.
    pub async fn complete(&self, params: CompleteParams) -> PipelineResult<CompleteOutcome> {
        let job = JobId::next();
        info!(
            %job,
            double_generation = params.double_generation,
            clip_length = params.clip_length,
            "Complete phase started"
        );

        let result = self.run_complete(job, &params).await;
        self.registry.release_all(job).await;

        match &result {
            Ok(outcome) => {
                info!(%job, video_url = %outcome.video_url, "Complete phase finished");
            }
            Err(e) => {
                self.report_failure(
                    "complete",
                    job,
                    e,
                    json!({
                        "jobId": job,
                        "aiVideoFileId": params.ai_video_file_id,
                        "clipLength": params.clip_length,
                        "doubleGeneration": params.double_generation,
                        "generationType": params.generation_type,
                    }),
                )
                .await;
            }
        }
        result
    }

    async fn run_complete(
        &self,
        job: JobId,
        params: &CompleteParams,
    ) -> PipelineResult<CompleteOutcome> {
        params.validate()?;

        // Fetch the generated clip
        let generated = self.registry.scratch_path("ai_generated", job, "mp4");
        self.registry.register(generated.clone(), job, "fetch");
        let file_id = FileId(params.ai_video_file_id.trim().to_string());
        self.generator.fetch(&file_id, &generated).await?;

        // Optional doubling: play forward then backward
        let (clip, effective_len) = if params.double_generation {
            let reversed = self.registry.scratch_path("ai_reversed", job, "mp4");
            self.registry.register(reversed.clone(), job, "reverse");
            self.stages.reverse(&generated, &reversed).await?;

            let doubled = self.registry.scratch_path("ai_doubled", job, "mp4");
            self.registry.register(doubled.clone(), job, "concat");
            self.stages
                .concat_merge(&generated, &reversed, &doubled)
                .await?;

            (doubled, params.effective_clip_length())
        } else {
            (generated, params.clip_length)
        };

        // Background audio, truncated to the effective length
        let audio = self.registry.scratch_path("audio", job, "mp3");
        self.registry.register(audio.clone(), job, "audio_download");
        self.store.download(params.audio_url.trim(), &audio).await?;

        let mixed = self
            .registry
            .scratch_path("generated_with_audio", job, "mp4");
        self.registry.register(mixed.clone(), job, "audio_mix");
        self.stages
            .audio_mix(&clip, &audio, &mixed, effective_len)
            .await?;

        // The trimmed clip uploaded during the initiate phase
        let trimmed = self.registry.scratch_path("trimmed", job, "mp4");
        self.registry.register(trimmed.clone(), job, "trimmed_download");
        self.store
            .download(params.trimmed_video.trim(), &trimmed)
            .await?;

        // Final composition: trimmed first, generated second
        let combined = self.registry.scratch_path("combined", job, "mp4");
        self.registry.register(combined.clone(), job, "concat");
        self.stages
            .concat_merge(&trimmed, &mixed, &combined)
            .await?;

        // Publish
        let video_url = self
            .store
            .upload_video(&combined, &format!("videos/combined_{job}.mp4"))
            .await?;
        self.events
            .record_video(&video_url, "Generated video", &params.generation_type)
            .await?;

        // The trimmed clip in storage has served its purpose;
        // deleting it is best-effort and never fails the job.
        if let Some(object_path) = object_path_from_url(params.trimmed_video.trim()) {
            if let Err(e) = self.store.delete(&object_path).await {
                warn!(%job, object_path, "Failed to delete trimmed clip from storage: {e}");
            }
        }

        if let Some(email) = params.email.as_deref() {
            self.notifier.video_ready(email, &video_url).await;
        }

        Ok(CompleteOutcome { video_url })
    }

    /// Report a fatal job error once: full detail to the logs and the
    /// error-log collaborator. The caller sees only the taxonomy
    /// error (and, via the API layer, a generic message).
    async fn report_failure(
        &self,
        phase: &'static str,
        job: JobId,
        err: &PipelineError,
        detail: serde_json::Value,
    ) {
        error!(%job, phase, "Pipeline job failed: {err}");
        if err.is_client_error() {
            // Validation failures are the caller's problem, not ours
            return;
        }
        if let Err(log_err) = self.events.log_error(phase, &err.to_string(), detail).await {
            warn!(%job, "Failed to write error record: {log_err}");
        }
    }
}
