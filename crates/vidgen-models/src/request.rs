//! Pipeline request parameters and validation.
//!
//! Validation mirrors the public API contract: failures name the
//! offending field and are reported to the caller as 4xx responses,
//! before any filesystem or network work happens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum clip length accepted by the initiate phase, in seconds.
pub const INITIATE_CLIP_MIN: f64 = 0.1;
/// Maximum clip length accepted by the initiate phase, in seconds.
pub const INITIATE_CLIP_MAX: f64 = 60.0;
/// Minimum clip length accepted by the complete phase, in seconds.
pub const COMPLETE_CLIP_MIN: f64 = 0.1;
/// Maximum clip length accepted by the complete phase, in seconds.
pub const COMPLETE_CLIP_MAX: f64 = 120.0;
/// Prompt length bounds, in characters.
pub const PROMPT_MIN_LEN: usize = 1;
pub const PROMPT_MAX_LEN: usize = 500;

/// A request parameter failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field, as it appears on the wire.
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

fn check_number(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a valid number"));
    }
    if value < min {
        return Err(ValidationError::new(
            field,
            format!("must be at least {}", min),
        ));
    }
    if value > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {}", max),
        ));
    }
    Ok(())
}

fn check_string(
    field: &'static str,
    value: &str,
    min_len: usize,
    max_len: usize,
) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.len() < min_len {
        return Err(ValidationError::new(
            field,
            if trimmed.is_empty() {
                "is required".to_string()
            } else {
                format!("must be at least {} characters", min_len)
            },
        ));
    }
    if trimmed.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }
    Ok(())
}

/// Parameters for the initiate phase (trim, extract frame, submit).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateParams {
    /// Requested clip length in seconds.
    pub clip_length: f64,
    /// Text prompt for the generation service.
    pub prompt: String,
    /// Generation flavor recorded in the feed metadata.
    #[serde(default = "default_generation_type")]
    pub generation_type: String,
}

fn default_generation_type() -> String {
    "unknown".to_string()
}

impl InitiateParams {
    /// Validate parameter bounds; the first offending field wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_number(
            "clipLength",
            self.clip_length,
            INITIATE_CLIP_MIN,
            INITIATE_CLIP_MAX,
        )?;
        check_string("prompt", &self.prompt, PROMPT_MIN_LEN, PROMPT_MAX_LEN)?;
        Ok(())
    }
}

/// Parameters for the complete phase (fetch, compose, upload).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteParams {
    /// File id of the finished generation task result.
    pub ai_video_file_id: String,
    /// URL of the background audio track to mix in.
    pub audio_url: String,
    /// URL of the trimmed clip uploaded during the initiate phase.
    pub trimmed_video: String,
    /// Clip length in seconds, as requested at initiate time.
    pub clip_length: f64,
    /// Whether to play the generated clip forward then backward.
    #[serde(default)]
    pub double_generation: bool,
    /// Generation flavor recorded in the feed metadata.
    #[serde(default = "default_generation_type")]
    pub generation_type: String,
    /// Optional address to notify when the video is ready.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl CompleteParams {
    /// Validate parameter bounds; the first offending field wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_string("aiVideoFileId", &self.ai_video_file_id, 1, 256)?;
        check_string("audioUrl", &self.audio_url, 1, 2048)?;
        check_string("trimmedVideo", &self.trimmed_video, 1, 2048)?;
        check_number(
            "clipLength",
            self.clip_length,
            COMPLETE_CLIP_MIN,
            COMPLETE_CLIP_MAX,
        )?;
        Ok(())
    }

    /// Clip length actually used downstream of the doubling branch.
    pub fn effective_clip_length(&self) -> f64 {
        if self.double_generation {
            self.clip_length * 2.0
        } else {
            self.clip_length
        }
    }
}
