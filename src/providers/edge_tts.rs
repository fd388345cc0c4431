use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::errors::ToolError;
use crate::media::run_bounded;
use crate::providers::{SpeechSynthesizer, VoiceSettings};

/// Synthesizer that shells out to the `edge-tts` command line tool
#[derive(Debug, Clone)]
pub struct EdgeTtsSynthesizer {
    /// Executable name or path
    command: String,
    /// Limit per invocation
    timeout: Option<Duration>,
}

impl EdgeTtsSynthesizer {
    pub fn new(command: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    /// Argument list for one invocation
    ///
    /// Values are joined with `=` so negative rates and texts starting with a
    /// dash are not read as flags.
    pub fn build_args(text: &str, voice: &VoiceSettings, output: &Path) -> Vec<String> {
        vec![
            format!("--voice={}", voice.voice),
            format!("--rate={}", format_rate(voice.speed)),
            format!("--pitch={}", format_pitch(voice.pitch)),
            format!("--text={}", text),
            format!("--write-media={}", output.display()),
        ]
    }
}

/// Speed multiplier as an edge-tts rate, e.g. 1.25 -> "+25%"
pub fn format_rate(speed: f32) -> String {
    let percent = ((speed - 1.0) * 100.0).round() as i32;
    format!("{:+}%", percent)
}

/// Pitch offset as an edge-tts pitch, e.g. -5 -> "-5Hz"
pub fn format_pitch(pitch: i32) -> String {
    format!("{:+}Hz", pitch)
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceSettings, output: &Path) -> Result<PathBuf, ToolError> {
        let args = Self::build_args(text, voice, output);
        debug!("{} {}", self.command, args.join(" "));

        let mut command = Command::new(&self.command);
        command.args(&args);

        let result = run_bounded("edge-tts", command, self.timeout).await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ToolError::failed("edge-tts", result.status, stderr.trim()));
        }
        Ok(output.to_path_buf())
    }

    fn name(&self) -> &str {
        "edge-tts"
    }
}
