//! Pipeline error taxonomy.
//!
//! Validation failures are the caller's fault and map to 4xx; every
//! other variant is internal and surfaces to the caller only as a
//! generic error, with full detail going to logs and the error-log
//! collaborator. Cleanup failures never appear here at all: the
//! artifact registry logs them and moves on, so they can never mask a
//! job's real error.

use thiserror::Error;

use vidgen_genai::GenError;
use vidgen_media::MediaError;
use vidgen_models::ValidationError;
use vidgen_storage::StorageError;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Fatal errors for a pipeline job.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad request input; never retried, reported verbatim.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A transcode stage failed or timed out.
    #[error("Stage failed: {0}")]
    Stage(#[from] MediaError),

    /// The generation service failed, rejected, or timed out.
    #[error("Generation failed: {0}")]
    Generation(#[from] GenError),

    /// The storage or metadata collaborator failed.
    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Internal(String),
}

impl PipelineError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True when the failure is the caller's fault (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_client_error() {
        let validation: PipelineError = ValidationError::new("clipLength", "must be at least 0.1").into();
        assert!(validation.is_client_error());

        let stage: PipelineError = MediaError::Timeout(120).into();
        assert!(!stage.is_client_error());

        assert!(!PipelineError::internal("boom").is_client_error());
    }
}
