//! Canonical encoding profile.
//!
//! Every stage re-encodes to this profile so clips produced at
//! different points in the pipeline (trimmed source, AI-generated,
//! reversed, audio-mixed) can be concatenated without per-segment
//! re-negotiation.

use serde::{Deserialize, Serialize};

/// Fixed codec/resolution/frame-rate target shared by all stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingProfile {
    /// Output width in pixels (portrait)
    pub width: u32,
    /// Output height in pixels (portrait)
    pub height: u32,
    /// Output frame rate
    pub fps: u32,
    /// Video codec
    pub video_codec: String,
    /// x264 CRF quality
    pub crf: u8,
    /// x264 preset
    pub preset: String,
    /// Pixel format
    pub pixel_format: String,
    /// Audio codec
    pub audio_codec: String,
    /// Audio bitrate
    pub audio_bitrate: String,
    /// Audio sample rate in Hz
    pub audio_sample_rate: u32,
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            video_codec: "libx264".to_string(),
            crf: 23,
            preset: "veryfast".to_string(),
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            audio_sample_rate: 44100,
        }
    }
}

impl EncodingProfile {
    /// Video filter that crops to the portrait aspect ratio and scales
    /// to the canonical frame, normalizing frame rate and sample
    /// aspect ratio.
    pub fn crop_scale_filter(&self) -> String {
        format!(
            "crop='min(iw,ih*{w}/{h})':'min(ih,iw*{h}/{w})',scale={w}:{h},setsar=1,fps={fps}",
            w = self.width,
            h = self.height,
            fps = self.fps,
        )
    }

    /// Video filter that fits a frame inside the canonical size and
    /// letterboxes the remainder, used when merging clips that may
    /// have drifted in resolution.
    pub fn pad_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}",
            w = self.width,
            h = self.height,
            fps = self.fps,
        )
    }

    /// Scale filter for still-frame extraction at the canonical size.
    pub fn frame_scale_filter(&self) -> String {
        format!("scale={}:{}", self.width, self.height)
    }
}
