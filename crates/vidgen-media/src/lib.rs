//! FFmpeg CLI wrapper for the video pipeline stages.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multi-input support
//! - A runner that bounds every invocation with a timeout and kills
//!   the process on expiry
//! - FFprobe metadata (duration, audio-stream presence)
//! - The five pipeline stages: trim, extract-last-frame, reverse,
//!   concat-merge, audio-mix
//! - Streaming HTTP download of remote media to disk

pub mod command;
pub mod download;
pub mod error;
pub mod probe;
pub mod stages;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use download::download_to_file;
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use stages::{StageExecutor, StageResult, StageTimeouts};
