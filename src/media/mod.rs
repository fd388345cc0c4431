/*!
 * Media transcoding collaborators.
 *
 * The pipeline never builds ffmpeg command lines itself; it talks to a
 * `Transcoder`, which takes explicit input and output paths and reports
 * success or a `ToolError` carrying the tool's diagnostic:
 * - `ffmpeg`: the production adapter around the ffmpeg/ffprobe binaries
 * - `mock`: an in-process double that writes placeholder files
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use tokio::process::Command;

use crate::errors::ToolError;
use crate::subtitle_processor::ClipRange;

pub mod ffmpeg;
pub mod mock;

pub use ffmpeg::FfmpegTranscoder;
pub use mock::{MockOperation, MockTranscoder};

/// Parameters for a focus interlude clip
#[derive(Debug, Clone, PartialEq)]
pub struct InterludeSpec {
    pub message: String,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub background_color: String,
    pub font_color: String,
    pub font_size: u32,
    pub font_file: Option<String>,
}

/// Audio clip placed at an offset inside a base track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedClip {
    pub path: PathBuf,
    pub delay_ms: u64,
}

/// Media operations the pipeline depends on
///
/// Every method writes exactly one output file and returns only after the
/// underlying tool has exited.
#[async_trait]
pub trait Transcoder: Send + Sync + Debug {
    /// Remux `input` to `output` without re-encoding
    async fn stream_copy(&self, input: &Path, output: &Path) -> Result<(), ToolError>;

    /// Cut `range` out of a longer source, re-encoding for accurate boundaries
    async fn extract_range(&self, input: &Path, range: ClipRange, output: &Path) -> Result<(), ToolError>;

    /// Burn an SRT caption file into the video, copying the audio
    ///
    /// `force_style` is an ASS style override such as `FontName=Arial,FontSize=48`.
    async fn burn_captions(
        &self,
        input: &Path,
        captions: &Path,
        force_style: &str,
        output: &Path,
    ) -> Result<(), ToolError>;

    /// Render a solid-background clip with centered text and a silent audio track
    async fn render_interlude(&self, spec: &InterludeSpec, output: &Path) -> Result<(), ToolError>;

    /// Container duration in seconds
    async fn probe_duration(&self, input: &Path) -> Result<f64, ToolError>;

    /// Silent stereo audio of the given length
    async fn render_silence(&self, duration_secs: f64, output: &Path) -> Result<(), ToolError>;

    /// Additively mix delayed clips over `base`; the result is as long as `base`
    async fn mix_delayed(&self, base: &Path, clips: &[DelayedClip], output: &Path) -> Result<(), ToolError>;

    /// Copy the video stream of `video` and take the audio from `audio`
    async fn replace_audio(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), ToolError>;

    /// Join the files listed in a concat manifest, in manifest order, without re-encoding
    async fn concatenate(&self, manifest: &Path, output: &Path) -> Result<(), ToolError>;
}

/// Run an external command to completion, bounded by `limit` when set
///
/// The child is killed if the limit elapses first.
pub async fn run_bounded(tool: &str, mut command: Command, limit: Option<Duration>) -> Result<Output, ToolError> {
    command.kill_on_drop(true);
    let spawn_error = |e: std::io::Error| ToolError::Spawn {
        tool: tool.to_string(),
        message: e.to_string(),
    };

    match limit {
        Some(limit) => {
            tokio::select! {
                result = command.output() => result.map_err(spawn_error),
                _ = tokio::time::sleep(limit) => Err(ToolError::Timeout {
                    tool: tool.to_string(),
                    seconds: limit.as_secs(),
                }),
            }
        }
        None => command.output().await.map_err(spawn_error),
    }
}

/// Convert a configured limit in seconds, where 0 means unbounded
pub fn timeout_from_secs(seconds: u64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds))
}
