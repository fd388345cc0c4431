/*!
 * Speech synthesis providers.
 *
 * This module contains client implementations for the supported engines:
 * - edge-tts: Microsoft Edge voices through the `edge-tts` command line tool
 * - OpenAI: the `/audio/speech` HTTP endpoint
 * - mock: an in-process double for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{TtsConfig, TtsProvider};
use crate::errors::ToolError;

pub mod edge_tts;
pub mod mock;
pub mod openai;

pub use edge_tts::EdgeTtsSynthesizer;
pub use mock::MockSynthesizer;
pub use openai::OpenAiSynthesizer;

/// Voice parameters passed with every synthesis request
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    /// Provider-specific voice identifier
    pub voice: String,
    /// Speaking rate multiplier, 1.0 is normal speed
    pub speed: f32,
    /// Pitch shift in Hz; ignored by providers without pitch control
    pub pitch: i32,
}

impl From<&TtsConfig> for VoiceSettings {
    fn from(config: &TtsConfig) -> Self {
        Self {
            voice: config.voice.clone(),
            speed: config.speed,
            pitch: config.pitch,
        }
    }
}

/// Common trait for all speech synthesis providers
///
/// Implementations turn one line of text into one audio file and must not
/// return until the file is fully written.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    /// Synthesize `text` into `output`
    ///
    /// # Returns
    /// * `Result<PathBuf, ToolError>` - The path of the written audio clip
    async fn synthesize(&self, text: &str, voice: &VoiceSettings, output: &Path) -> Result<PathBuf, ToolError>;

    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Extension of the files this provider writes
    fn file_extension(&self) -> &str {
        "mp3"
    }
}

/// Build the provider selected by `config`
pub fn synthesizer_from_config(config: &TtsConfig, timeout: Option<Duration>) -> Arc<dyn SpeechSynthesizer> {
    match config.provider {
        TtsProvider::EdgeTts => Arc::new(EdgeTtsSynthesizer::new(config.command.clone(), timeout)),
        TtsProvider::OpenAI => Arc::new(OpenAiSynthesizer::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.model.clone(),
            timeout,
        )),
    }
}
