//! Error types for the generation service client.

use thiserror::Error;

use crate::retry::RetryClass;

/// Result type for generation operations.
pub type GenResult<T> = Result<T, GenError>;

/// Errors from the generation service and its transport.
#[derive(Debug, Error)]
pub enum GenError {
    /// The remote rejected or mangled the submission.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The remote returned a non-success HTTP status.
    #[error("Generation service returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport-level failure (connect, read, TLS).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The task reached a terminal failure state.
    #[error("Generation task failed: {0}")]
    GenerationFailed(String),

    /// The task did not reach a terminal state within the poll budget.
    #[error("Generation task not finished after {attempts} poll attempts")]
    GenerationTimeout { attempts: u32 },

    /// The service reported no download URL for a finished file.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// The media transfer exceeded its bound.
    #[error("Download timed out after {0} seconds")]
    DownloadTimeout(u64),

    /// Downloading the finished media failed.
    #[error("Download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }
}

impl RetryClass for GenError {
    /// Client-side rejections (4xx) are permanent: the request will
    /// not become valid by retrying it.
    fn is_permanent(&self) -> bool {
        matches!(self, GenError::Http { status, .. } if (400..500).contains(status))
    }
}

impl From<vidgen_media::MediaError> for GenError {
    fn from(e: vidgen_media::MediaError) -> Self {
        match e {
            vidgen_media::MediaError::DownloadTimeout(secs) => GenError::DownloadTimeout(secs),
            vidgen_media::MediaError::Io(io) => GenError::Io(io),
            other => GenError::Download(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_permanent() {
        assert!(GenError::http(400, "bad request").is_permanent());
        assert!(GenError::http(401, "unauthorized").is_permanent());
        assert!(GenError::http(422, "unprocessable").is_permanent());
    }

    #[test]
    fn test_server_errors_are_transient() {
        assert!(!GenError::http(500, "internal").is_permanent());
        assert!(!GenError::http(503, "unavailable").is_permanent());
        assert!(!GenError::Submission("no task id".to_string()).is_permanent());
    }
}
