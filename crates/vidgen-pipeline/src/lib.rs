//! Pipeline orchestrator.
//!
//! Sequences the transcode stages, the generation task client, and
//! the storage collaborators into the two public phases:
//!
//! - **initiate**: trim the source, extract its last frame, submit
//!   frame + prompt to the generation service, upload the trimmed
//!   clip, return the task handle without waiting for generation.
//! - **complete**: fetch the generated clip, optionally double it
//!   (forward then backward), mix in background audio, merge with the
//!   trimmed clip, publish the result.
//!
//! Every temp file a job creates is tracked by the artifact registry
//! and deleted on every exit path, success or failure.

pub mod artifacts;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod traits;

pub use artifacts::ArtifactRegistry;
pub use error::{PipelineError, PipelineResult};
pub use notify::{LogNotifier, Notifier};
pub use orchestrator::{CompleteOutcome, InitiateOutcome, Pipeline};
pub use traits::{EventLog, Generator, MediaStore, VideoStages};
