//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from the storage and metadata services.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage service returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upload succeeded but no download token was returned")]
    MissingToken,

    #[error("Download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }
}

impl From<vidgen_media::MediaError> for StorageError {
    fn from(e: vidgen_media::MediaError) -> Self {
        match e {
            vidgen_media::MediaError::Io(io) => StorageError::Io(io),
            other => StorageError::Download(other.to_string()),
        }
    }
}
