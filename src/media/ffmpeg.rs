use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::MediaConfig;
use crate::errors::ToolError;
use crate::media::{run_bounded, timeout_from_secs, DelayedClip, InterludeSpec, Transcoder};
use crate::subtitle_processor::ClipRange;

const SAMPLE_RATE: u32 = 44_100;

/// Transcoder backed by the ffmpeg and ffprobe command line tools
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Option<Duration>,
    video_codec: String,
    audio_codec: String,
    preset: String,
    audio_bitrate: String,
}

impl FfmpegTranscoder {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            timeout: timeout_from_secs(config.timeout_secs),
            video_codec: config.video_codec.clone(),
            audio_codec: config.audio_codec.clone(),
            preset: config.preset.clone(),
            audio_bitrate: config.audio_bitrate.clone(),
        }
    }

    /// Run ffmpeg with `args`, overwriting the output
    async fn run_ffmpeg(&self, args: Vec<OsString>) -> Result<(), ToolError> {
        debug!(
            "{} {}",
            self.ffmpeg_path,
            args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
        );

        let mut command = Command::new(&self.ffmpeg_path);
        command.args(["-hide_banner", "-nostdin", "-y"]).args(&args);

        let output = run_bounded("ffmpeg", command, self.timeout).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("ffmpeg failed: {}", filtered);
            return Err(ToolError::failed("ffmpeg", output.status, filtered));
        }
        Ok(())
    }

    fn encode_video_args(&self) -> Vec<OsString> {
        os_args(["-c:v", self.video_codec.as_str(), "-preset", self.preset.as_str(), "-pix_fmt", "yuv420p"])
    }

    fn encode_audio_args(&self) -> Vec<OsString> {
        os_args(["-c:a", self.audio_codec.as_str(), "-b:a", self.audio_bitrate.as_str()])
    }
}

fn os_args<const N: usize>(args: [&str; N]) -> Vec<OsString> {
    args.into_iter().map(OsString::from).collect()
}

/// Escape a path for use as a filter option value
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
        .replace(',', "\\,")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace(';', "\\;")
}

/// Escape text for drawtext's single-quoted `text` option
///
/// Straight apostrophes cannot appear inside the quotes and become `’`.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\u{2019}")
        .replace('%', "\\%")
        .replace(':', "\\:")
}

/// `#RRGGBB[AA]` becomes `0xRRGGBB[AA]`; colour names pass through
pub fn ffmpeg_color(color: &str) -> String {
    match color.trim().strip_prefix('#') {
        Some(hex) => format!("0x{}", hex),
        None => color.trim().to_string(),
    }
}

/// Filter graph mixing every clip, delayed by its offset, over input 0
pub fn delay_mix_filter(clips: &[DelayedClip]) -> String {
    let mut parts = Vec::with_capacity(clips.len() + 1);
    let mut labels = String::from("[0:a]");

    for (i, clip) in clips.iter().enumerate() {
        parts.push(format!(
            "[{input}:a]adelay={delay}|{delay}[s{i}]",
            input = i + 1,
            delay = clip.delay_ms,
            i = i
        ));
        labels.push_str(&format!("[s{}]", i));
    }

    parts.push(format!(
        "{}amix=inputs={}:duration=first:dropout_transition=0:normalize=0[mix]",
        labels,
        clips.len() + 1
    ));
    parts.join(";")
}

/// Keep only the lines of ffmpeg stderr that describe the failure
///
/// Drops the version banner, build configuration and stream listings.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    const NOISE_PREFIXES: &[&str] = &[
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "libav",
        "libsw",
        "libpostproc",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "encoder",
        "handler_name",
        "major_brand",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !NOISE_PREFIXES.iter().any(|prefix| line.starts_with(prefix)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Read `format.duration` from `ffprobe -of json` output
pub fn parse_probe_duration(stdout: &str) -> Result<f64, ToolError> {
    let parse_error = |message: String| ToolError::ParseError {
        tool: "ffprobe".to_string(),
        message,
    };

    let json: Value = serde_json::from_str(stdout).map_err(|e| parse_error(e.to_string()))?;
    let duration = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .ok_or_else(|| parse_error("no format.duration in output".to_string()))?;

    let seconds = match duration {
        Value::String(s) => s.trim().parse::<f64>().map_err(|e| parse_error(e.to_string()))?,
        Value::Number(n) => n.as_f64().ok_or_else(|| parse_error("duration out of range".to_string()))?,
        other => return Err(parse_error(format!("unexpected duration value {}", other))),
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(parse_error(format!("invalid duration {}", seconds)));
    }
    Ok(seconds)
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn stream_copy(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let mut args = os_args(["-i"]);
        args.push(input.into());
        args.extend(os_args(["-c", "copy"]));
        args.push(output.into());
        self.run_ffmpeg(args).await
    }

    async fn extract_range(&self, input: &Path, range: ClipRange, output: &Path) -> Result<(), ToolError> {
        let start = format!("{:.3}", range.start_seconds());
        let length = format!("{:.3}", range.end_seconds() - range.start_seconds());

        let mut args = os_args(["-ss", start.as_str(), "-i"]);
        args.push(input.into());
        args.extend(os_args(["-t", length.as_str()]));
        args.extend(self.encode_video_args());
        args.extend(self.encode_audio_args());
        args.push(output.into());
        self.run_ffmpeg(args).await
    }

    async fn burn_captions(
        &self,
        input: &Path,
        captions: &Path,
        force_style: &str,
        output: &Path,
    ) -> Result<(), ToolError> {
        let filter = format!(
            "subtitles=filename={}:force_style='{}'",
            escape_filter_path(captions),
            force_style
        );

        let mut args = os_args(["-i"]);
        args.push(input.into());
        args.extend(os_args(["-vf", filter.as_str()]));
        args.extend(self.encode_video_args());
        args.extend(os_args(["-c:a", "copy"]));
        args.push(output.into());
        self.run_ffmpeg(args).await
    }

    async fn render_interlude(&self, spec: &InterludeSpec, output: &Path) -> Result<(), ToolError> {
        let duration = format!("{:.3}", spec.duration_secs);
        let background = format!(
            "color=c={}:s={}x{}:d={}:r=30",
            ffmpeg_color(&spec.background_color),
            spec.width,
            spec.height,
            duration
        );
        let silence = format!("anullsrc=r={}:cl=stereo", SAMPLE_RATE);

        let mut drawtext = format!(
            "drawtext=text='{}':fontcolor={}:fontsize={}:x=(w-tw)/2:y=(h-th)/2",
            escape_drawtext(&spec.message),
            ffmpeg_color(&spec.font_color),
            spec.font_size
        );
        if let Some(font_file) = &spec.font_file {
            drawtext.push_str(&format!(":fontfile={}", escape_filter_path(Path::new(font_file))));
        }

        let mut args = os_args([
            "-f",
            "lavfi",
            "-i",
            background.as_str(),
            "-f",
            "lavfi",
            "-i",
            silence.as_str(),
            "-t",
            duration.as_str(),
            "-vf",
            drawtext.as_str(),
        ]);
        args.extend(self.encode_video_args());
        args.extend(self.encode_audio_args());
        args.extend(os_args(["-shortest"]));
        args.push(output.into());
        self.run_ffmpeg(args).await
    }

    async fn probe_duration(&self, input: &Path) -> Result<f64, ToolError> {
        let mut command = Command::new(&self.ffprobe_path);
        command
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(input);

        let output = run_bounded("ffprobe", command, self.timeout).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::failed("ffprobe", output.status, filter_ffmpeg_stderr(&stderr)));
        }

        parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
    }

    async fn render_silence(&self, duration_secs: f64, output: &Path) -> Result<(), ToolError> {
        let source = format!("anullsrc=r={}:cl=stereo", SAMPLE_RATE);
        let duration = format!("{:.3}", duration_secs);

        let mut args = os_args(["-f", "lavfi", "-i", source.as_str(), "-t", duration.as_str(), "-c:a", "pcm_s16le"]);
        args.push(output.into());
        self.run_ffmpeg(args).await
    }

    async fn mix_delayed(&self, base: &Path, clips: &[DelayedClip], output: &Path) -> Result<(), ToolError> {
        let mut args = os_args(["-i"]);
        args.push(base.into());
        for clip in clips {
            args.push("-i".into());
            args.push(clip.path.as_os_str().to_os_string());
        }

        let filter = delay_mix_filter(clips);
        args.extend(os_args(["-filter_complex", filter.as_str(), "-map", "[mix]", "-c:a", "pcm_s16le"]));
        args.push(output.into());
        self.run_ffmpeg(args).await
    }

    async fn replace_audio(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), ToolError> {
        let mut args = os_args(["-i"]);
        args.push(video.into());
        args.push("-i".into());
        args.push(audio.into());
        args.extend(os_args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy"]));
        args.extend(self.encode_audio_args());
        args.push(output.into());
        self.run_ffmpeg(args).await
    }

    async fn concatenate(&self, manifest: &Path, output: &Path) -> Result<(), ToolError> {
        let mut args = os_args(["-f", "concat", "-safe", "0", "-i"]);
        args.push(manifest.into());
        args.extend(os_args(["-c", "copy"]));
        args.push(output.into());
        self.run_ffmpeg(args).await
    }
}
