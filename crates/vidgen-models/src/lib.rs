//! Shared types for the video generation pipeline.
//!
//! This crate defines:
//! - Job identifiers (timestamp-derived, unique within the process)
//! - Request/response types for both pipeline phases
//! - Parameter validation with field-level error messages
//! - The canonical encoding profile all stages re-encode to

pub mod encoding;
pub mod job;
pub mod request;

pub use encoding::EncodingProfile;
pub use job::JobId;
pub use request::{
    CompleteParams, InitiateParams, ValidationError, COMPLETE_CLIP_MAX, COMPLETE_CLIP_MIN,
    INITIATE_CLIP_MAX, INITIATE_CLIP_MIN, PROMPT_MAX_LEN, PROMPT_MIN_LEN,
};
