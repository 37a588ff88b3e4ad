//! Artifact registry: guaranteed cleanup of per-job temp files.
//!
//! The registry is the sole authority allowed to delete temp
//! artifacts. Stages receive and return paths but never remove them;
//! the orchestrator registers every path before the stage that writes
//! it runs, so even a half-written output from a killed process gets
//! cleaned up.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};
use vidgen_models::JobId;

/// One on-disk file owned by a job.
#[derive(Debug, Clone)]
pub struct TempArtifact {
    pub path: PathBuf,
    /// Stage that produced (or will produce) the file.
    pub stage: &'static str,
}

/// Tracks every temp file a job creates and guarantees deletion on
/// all exit paths.
#[derive(Debug)]
pub struct ArtifactRegistry {
    scratch_dir: PathBuf,
    inner: Mutex<HashMap<JobId, Vec<TempArtifact>>>,
}

impl ArtifactRegistry {
    /// Create a registry rooted at the given scratch directory,
    /// creating the directory if needed.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let scratch_dir = scratch_dir.into();
        std::fs::create_dir_all(&scratch_dir)?;
        Ok(Self {
            scratch_dir,
            inner: Mutex::new(HashMap::new()),
        })
    }

    /// The shared scratch directory.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Build the canonical temp path for a job: `<kind>_<timestamp>.<ext>`.
    ///
    /// Embedding the job id keeps concurrent jobs from ever sharing a
    /// path; this naming scheme is load-bearing and must not change.
    pub fn scratch_path(&self, kind: &str, job: JobId, ext: &str) -> PathBuf {
        self.scratch_dir.join(format!("{kind}_{job}.{ext}"))
    }

    /// Register a path as owned by a job.
    pub fn register(&self, path: impl Into<PathBuf>, job: JobId, stage: &'static str) {
        let path = path.into();
        debug!(%job, stage, path = %path.display(), "Registered artifact");
        self.inner
            .lock()
            .expect("artifact registry lock poisoned")
            .entry(job)
            .or_default()
            .push(TempArtifact { path, stage });
    }

    /// Number of artifacts currently tracked for a job.
    pub fn tracked(&self, job: JobId) -> usize {
        self.inner
            .lock()
            .expect("artifact registry lock poisoned")
            .get(&job)
            .map_or(0, Vec::len)
    }

    /// Delete every artifact registered for a job.
    ///
    /// Idempotent and best-effort: already-missing files are fine, and
    /// unlink failures are logged but never surfaced, so cleanup can
    /// never mask the job's real error.
    pub async fn release_all(&self, job: JobId) {
        let artifacts = self
            .inner
            .lock()
            .expect("artifact registry lock poisoned")
            .remove(&job)
            .unwrap_or_default();

        for artifact in artifacts {
            match tokio::fs::remove_file(&artifact.path).await {
                Ok(()) => {
                    debug!(%job, stage = artifact.stage, path = %artifact.path.display(), "Removed artifact")
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    %job,
                    stage = artifact.stage,
                    path = %artifact.path.display(),
                    "Failed to remove artifact: {e}"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_release_all_removes_registered_files() {
        let dir = TempDir::new().unwrap();
        let registry = ArtifactRegistry::new(dir.path()).unwrap();
        let job = JobId::next();

        let a = registry.scratch_path("trimmed", job, "mp4");
        let b = registry.scratch_path("last_frame", job, "jpg");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();
        registry.register(&a, job, "trim");
        registry.register(&b, job, "extract_frame");

        registry.release_all(job).await;

        assert!(!a.exists());
        assert!(!b.exists());
        assert_eq!(registry.tracked(job), 0);
    }

    #[tokio::test]
    async fn test_release_all_tolerates_missing_files_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let registry = ArtifactRegistry::new(dir.path()).unwrap();
        let job = JobId::next();

        // Registered but never written
        registry.register(registry.scratch_path("trimmed", job, "mp4"), job, "trim");

        registry.release_all(job).await;
        registry.release_all(job).await;
        assert_eq!(registry.tracked(job), 0);
    }

    #[tokio::test]
    async fn test_release_all_scoped_to_one_job() {
        let dir = TempDir::new().unwrap();
        let registry = ArtifactRegistry::new(dir.path()).unwrap();
        let job_a = JobId::next();
        let job_b = JobId::next();

        let a = registry.scratch_path("trimmed", job_a, "mp4");
        let b = registry.scratch_path("trimmed", job_b, "mp4");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();
        registry.register(&a, job_a, "trim");
        registry.register(&b, job_b, "trim");

        registry.release_all(job_a).await;

        assert!(!a.exists());
        assert!(b.exists(), "other jobs' artifacts must be untouched");
    }

    #[test]
    fn test_scratch_path_embeds_job_id() {
        let dir = TempDir::new().unwrap();
        let registry = ArtifactRegistry::new(dir.path()).unwrap();
        let job = JobId::from_raw(1700000000123);

        let path = registry.scratch_path("last_frame", job, "jpg");
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "last_frame_1700000000123.jpg"
        );
    }
}
