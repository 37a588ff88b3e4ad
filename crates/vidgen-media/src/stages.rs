//! Pipeline stage operations.
//!
//! Each stage is one bounded FFmpeg invocation: it reads its declared
//! inputs, writes a brand-new output path, and never mutates an input.
//! All video outputs are re-encoded to the canonical profile so later
//! concatenation never has to re-negotiate per segment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;
use vidgen_models::EncodingProfile;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_video;

/// Margin subtracted from the probed duration when seeking to the last
/// frame, so the seek never lands past end-of-stream.
const LAST_FRAME_MARGIN_SECS: f64 = 0.1;

/// Per-operation timeouts. Expiry kills the ffmpeg process.
#[derive(Debug, Clone)]
pub struct StageTimeouts {
    pub trim: Duration,
    pub extract_frame: Duration,
    pub reverse: Duration,
    pub concat: Duration,
    pub audio_mix: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            trim: Duration::from_secs(120),
            extract_frame: Duration::from_secs(30),
            reverse: Duration::from_secs(180),
            concat: Duration::from_secs(300),
            audio_mix: Duration::from_secs(180),
        }
    }
}

/// Output of a stage: the new path plus the metadata the next stage
/// needs to build its own invocation.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub output: PathBuf,
    /// Duration of the output in seconds.
    pub duration: f64,
    /// Whether the output carries an audio stream.
    pub has_audio: bool,
}

/// Executor for the transcode stages.
#[derive(Debug, Clone)]
pub struct StageExecutor {
    profile: EncodingProfile,
    timeouts: StageTimeouts,
}

impl StageExecutor {
    pub fn new(profile: EncodingProfile, timeouts: StageTimeouts) -> Self {
        Self { profile, timeouts }
    }

    /// The canonical profile this executor re-encodes to.
    pub fn profile(&self) -> &EncodingProfile {
        &self.profile
    }

    /// Cut `[0, clip_len)` from the input and re-encode to the
    /// canonical portrait profile (crop then scale).
    pub async fn trim(
        &self,
        input: &Path,
        output: &Path,
        clip_len: f64,
    ) -> MediaResult<StageResult> {
        let cmd = self
            .with_video_encode(FfmpegCommand::new(input, output))
            .seek(0.0)
            .duration(clip_len)
            .video_filter(self.profile.crop_scale_filter())
            .audio_codec(&self.profile.audio_codec)
            .audio_bitrate(&self.profile.audio_bitrate);

        FfmpegRunner::new(self.timeouts.trim).run(&cmd).await?;
        self.finish("trim", output).await
    }

    /// Capture a still frame just before the end of the input, scaled
    /// to the canonical frame size.
    pub async fn extract_last_frame(&self, input: &Path, output: &Path) -> MediaResult<PathBuf> {
        let info = probe_video(input).await?;
        let seek_to = (info.duration - LAST_FRAME_MARGIN_SECS).max(0.0);

        let cmd = FfmpegCommand::new(input, output)
            .seek(seek_to)
            .single_frame()
            .video_filter(self.profile.frame_scale_filter());

        FfmpegRunner::new(self.timeouts.extract_frame).run(&cmd).await?;
        info!(output = %output.display(), seek_to, "Extracted last frame");
        Ok(output.to_path_buf())
    }

    /// Produce a time-reversed copy of the input, reversing the audio
    /// stream too when one exists.
    pub async fn reverse(&self, input: &Path, output: &Path) -> MediaResult<StageResult> {
        let info = probe_video(input).await?;
        let (filter, maps) = reverse_filtergraph(info.has_audio);

        let mut cmd = self
            .with_video_encode(FfmpegCommand::new(input, output))
            .filter_complex(filter);
        for map in maps {
            cmd = cmd.map(map);
        }
        if info.has_audio {
            cmd = cmd
                .audio_codec(&self.profile.audio_codec)
                .audio_bitrate(&self.profile.audio_bitrate);
        }

        FfmpegRunner::new(self.timeouts.reverse).run(&cmd).await?;
        self.finish("reverse", output).await
    }

    /// Join two clips, first then second, re-asserting the canonical
    /// profile and letterboxing both inputs to the canonical frame.
    pub async fn concat_merge(
        &self,
        first: &Path,
        second: &Path,
        output: &Path,
    ) -> MediaResult<StageResult> {
        let first_info = probe_video(first).await?;
        let second_info = probe_video(second).await?;

        let (filter, maps) = concat_filtergraph(
            &self.profile,
            (first_info.has_audio, first_info.duration),
            (second_info.has_audio, second_info.duration),
        );

        let mut cmd = self
            .with_video_encode(FfmpegCommand::new(first, output).add_input(second))
            .filter_complex(filter);
        for map in maps {
            cmd = cmd.map(map);
        }
        if first_info.has_audio || second_info.has_audio {
            cmd = cmd
                .audio_codec(&self.profile.audio_codec)
                .audio_bitrate(&self.profile.audio_bitrate);
        }

        FfmpegRunner::new(self.timeouts.concat).run(&cmd).await?;
        self.finish("concat", output).await
    }

    /// Overlay a local audio file onto a clip, truncated to
    /// `target_len` seconds, re-encoding both streams.
    pub async fn audio_mix(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        target_len: f64,
    ) -> MediaResult<StageResult> {
        let cmd = self
            .with_video_encode(FfmpegCommand::new(video, output).add_input(audio))
            .map("0:v:0")
            .map("1:a:0")
            .video_filter(self.profile.pad_filter())
            .audio_codec(&self.profile.audio_codec)
            .audio_bitrate(&self.profile.audio_bitrate)
            .output_duration(target_len)
            .shortest();

        FfmpegRunner::new(self.timeouts.audio_mix).run(&cmd).await?;
        self.finish("audio_mix", output).await
    }

    /// Common video encode arguments for the canonical profile.
    fn with_video_encode(&self, cmd: FfmpegCommand) -> FfmpegCommand {
        cmd.video_codec(&self.profile.video_codec)
            .crf(self.profile.crf)
            .preset(&self.profile.preset)
            .pixel_format(&self.profile.pixel_format)
    }

    /// Probe the freshly written output and assemble the stage result.
    async fn finish(&self, stage: &str, output: &Path) -> MediaResult<StageResult> {
        let info = probe_video(output).await?;
        info!(
            stage,
            output = %output.display(),
            duration = info.duration,
            has_audio = info.has_audio,
            "Stage complete"
        );
        Ok(StageResult {
            output: output.to_path_buf(),
            duration: info.duration,
            has_audio: info.has_audio,
        })
    }
}

/// Filtergraph for time reversal.
///
/// The audio branch is added only when the input actually has an audio
/// stream; a fixed graph that always expects audio fails on silent
/// clips.
pub fn reverse_filtergraph(has_audio: bool) -> (String, Vec<&'static str>) {
    if has_audio {
        (
            "[0:v]reverse[v];[0:a]areverse[a]".to_string(),
            vec!["[v]", "[a]"],
        )
    } else {
        ("[0:v]reverse[v]".to_string(), vec!["[v]"])
    }
}

/// Filtergraph for joining two clips.
///
/// Both video branches are letterboxed to the canonical frame. When
/// exactly one input carries audio, a silent track of the other
/// input's duration is synthesized so the concat filter sees a
/// consistent stream layout; when neither does, the graph is
/// video-only.
pub fn concat_filtergraph(
    profile: &EncodingProfile,
    first: (bool, f64),
    second: (bool, f64),
) -> (String, Vec<&'static str>) {
    let pad = profile.pad_filter();
    let rate = profile.audio_sample_rate;
    let with_audio = first.0 || second.0;

    let mut parts = vec![
        format!("[0:v]{pad}[v0]"),
        format!("[1:v]{pad}[v1]"),
    ];

    if with_audio {
        for (index, (has_audio, duration)) in [first, second].into_iter().enumerate() {
            if has_audio {
                parts.push(format!("[{index}:a]aresample={rate}[a{index}]"));
            } else {
                parts.push(format!(
                    "anullsrc=channel_layout=stereo:sample_rate={rate},atrim=duration={duration:.3}[a{index}]"
                ));
            }
        }
        parts.push("[v0][a0][v1][a1]concat=n=2:v=1:a=1[v][a]".to_string());
        (parts.join(";"), vec!["[v]", "[a]"])
    } else {
        parts.push("[v0][v1]concat=n=2:v=1:a=0[v]".to_string());
        (parts.join(";"), vec!["[v]"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_filtergraph_with_audio() {
        let (filter, maps) = reverse_filtergraph(true);
        assert!(filter.contains("[0:v]reverse"));
        assert!(filter.contains("[0:a]areverse"));
        assert_eq!(maps, vec!["[v]", "[a]"]);
    }

    #[test]
    fn test_reverse_filtergraph_silent_input_maps_video_only() {
        let (filter, maps) = reverse_filtergraph(false);
        assert!(filter.contains("[0:v]reverse"));
        assert!(!filter.contains("areverse"));
        assert!(!filter.contains("[0:a]"));
        assert_eq!(maps, vec!["[v]"]);
    }

    #[test]
    fn test_concat_filtergraph_both_audio() {
        let profile = EncodingProfile::default();
        let (filter, maps) = concat_filtergraph(&profile, (true, 3.0), (true, 3.0));
        assert!(filter.contains("concat=n=2:v=1:a=1"));
        assert!(!filter.contains("anullsrc"));
        assert_eq!(maps, vec!["[v]", "[a]"]);
    }

    #[test]
    fn test_concat_filtergraph_mixed_audio_synthesizes_silence() {
        let profile = EncodingProfile::default();
        let (filter, maps) = concat_filtergraph(&profile, (true, 3.0), (false, 5.0));
        assert!(filter.contains("concat=n=2:v=1:a=1"));
        assert!(filter.contains("anullsrc"));
        assert!(filter.contains("atrim=duration=5.000"));
        assert_eq!(maps, vec!["[v]", "[a]"]);
    }

    #[test]
    fn test_concat_filtergraph_no_audio() {
        let profile = EncodingProfile::default();
        let (filter, maps) = concat_filtergraph(&profile, (false, 3.0), (false, 3.0));
        assert!(filter.contains("concat=n=2:v=1:a=0"));
        assert!(!filter.contains("anullsrc"));
        assert_eq!(maps, vec!["[v]"]);
    }

    #[test]
    fn test_concat_filtergraph_letterboxes_both_inputs() {
        let profile = EncodingProfile::default();
        let (filter, _) = concat_filtergraph(&profile, (true, 3.0), (true, 3.0));
        assert_eq!(filter.matches("force_original_aspect_ratio").count(), 2);
    }
}
