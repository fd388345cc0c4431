use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::default::Default;
use url::Url;

use crate::errors::GenerationError;
use crate::language_utils;
use crate::practice::SubtitleMode;

// Application configuration module
// This module handles loading, defaulting and validating every setting a
// practice video run needs: languages, repetition, caption style, interludes,
// speech synthesis and the media toolchain.

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), the language spoken in the clip
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO), the language of the translations
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Repetition settings
    #[serde(default)]
    pub repeat: RepeatConfig,

    /// Burned-in caption style
    #[serde(default)]
    pub subtitle_style: SubtitleStyle,

    /// Focus interlude settings
    #[serde(default)]
    pub interlude: InterludeConfig,

    /// Speech synthesis for the first pass; absent disables it
    #[serde(default)]
    pub tts: Option<TtsConfig>,

    /// External media toolchain
    #[serde(default)]
    pub media: MediaConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How many passes to render and which captions each one shows
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepeatConfig {
    /// Number of passes over the clip
    #[serde(default = "default_repeat_count")]
    pub repeat_count: usize,

    /// Mode token per pass; shorter lists are padded with their last entry
    ///
    /// Tokens: `no_subtitle`, `source`, `target`, `source_target`, or language
    /// codes relative to the configured languages (`en`, `ko`, `en_ko`).
    #[serde(default = "default_subtitle_modes")]
    pub subtitle_modes: Vec<String>,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            repeat_count: default_repeat_count(),
            subtitle_modes: default_subtitle_modes(),
        }
    }
}

/// Caption placement in pixels
///
/// `x` becomes the left margin, `y` the distance from the bottom edge.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CaptionPosition {
    pub x: u32,
    pub y: u32,
}

impl Default for CaptionPosition {
    fn default() -> Self {
        Self { x: 50, y: 40 }
    }
}

/// Style applied when captions are burned into a pass
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubtitleStyle {
    #[serde(default = "default_font")]
    pub font: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default)]
    pub position: CaptionPosition,

    /// Drop shadow behind the text
    #[serde(default = "default_true")]
    pub shadow: bool,

    /// Text colour, `#RRGGBB` or `#RRGGBBAA`
    #[serde(default = "default_primary_color")]
    pub primary_color: String,

    #[serde(default = "default_outline_color")]
    pub outline_color: String,

    /// Box colour behind the text; alpha `80` is half transparent
    #[serde(default = "default_background_color")]
    pub background_color: String,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font: default_font(),
            font_size: default_font_size(),
            position: CaptionPosition::default(),
            shadow: true,
            primary_color: default_primary_color(),
            outline_color: default_outline_color(),
            background_color: default_background_color(),
        }
    }
}

/// Short clip shown between passes
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InterludeConfig {
    #[serde(default = "default_interlude_duration")]
    pub duration_secs: f64,

    #[serde(default = "default_interlude_width")]
    pub width: u32,

    #[serde(default = "default_interlude_height")]
    pub height: u32,

    /// Colour name or `#RRGGBB`
    #[serde(default = "default_interlude_background")]
    pub background_color: String,

    #[serde(default = "default_interlude_font_color")]
    pub font_color: String,

    #[serde(default = "default_interlude_font_size")]
    pub font_size: u32,

    /// Font file for the message text; ffmpeg's default font when absent
    #[serde(default)]
    pub font_file: Option<String>,

    /// Messages cycled by pass index; empty selects the built-in pair
    #[serde(default)]
    pub messages: Vec<String>,
}

impl Default for InterludeConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_interlude_duration(),
            width: default_interlude_width(),
            height: default_interlude_height(),
            background_color: default_interlude_background(),
            font_color: default_interlude_font_color(),
            font_size: default_interlude_font_size(),
            font_file: None,
            messages: Vec::new(),
        }
    }
}

/// Speech synthesis provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub enum TtsProvider {
    // @provider: edge-tts command line tool
    #[default]
    #[serde(rename = "edge-tts")]
    EdgeTts,
    // @provider: OpenAI speech endpoint
    #[serde(rename = "openai")]
    OpenAI,
}

impl TtsProvider {
    // @returns: Human readable provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::EdgeTts => "Edge TTS",
            Self::OpenAI => "OpenAI",
        }
    }

    // @returns: Provider identifier as written in config files
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::EdgeTts => "edge-tts".to_string(),
            Self::OpenAI => "openai".to_string(),
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TtsProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "edge-tts" | "edge_tts" | "edge" => Ok(Self::EdgeTts),
            "openai" => Ok(Self::OpenAI),
            _ => Err(anyhow!("Invalid speech provider: {}", s)),
        }
    }
}

/// Which text the synthesized voice reads
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TtsTextSource {
    /// The cue's source-language text
    #[default]
    Source,
    /// The text as transformed for the pass's caption mode
    PassMode,
}

/// What to do when speech synthesis fails
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TtsFailurePolicy {
    /// Fail the whole run
    #[default]
    Abort,
    /// Log a warning and keep the pass with its original audio
    KeepOriginalAudio,
}

/// Speech synthesis configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// Voice name, e.g. "en-US-GuyNeural" for edge-tts or "alloy" for OpenAI
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Speaking rate multiplier, 1.0 is normal speed
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Pitch shift in Hz (edge-tts only)
    #[serde(default)]
    pub pitch: i32,

    #[serde(default)]
    pub text_source: TtsTextSource,

    #[serde(default)]
    pub on_failure: TtsFailurePolicy,

    /// API key (OpenAI only)
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL (OpenAI only)
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Speech model (OpenAI only)
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Executable name or path (edge-tts only)
    #[serde(default = "default_edge_tts_command")]
    pub command: String,
}

impl TtsConfig {
    // @param provider: Provider enum
    // @returns: Config with that provider's defaults
    pub fn new(provider: TtsProvider) -> Self {
        let voice = match provider {
            TtsProvider::EdgeTts => default_voice(),
            TtsProvider::OpenAI => "alloy".to_string(),
        };
        Self {
            provider,
            voice,
            speed: default_speed(),
            pitch: 0,
            text_source: TtsTextSource::default(),
            on_failure: TtsFailurePolicy::default(),
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            model: default_openai_model(),
            command: default_edge_tts_command(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self::new(TtsProvider::default())
    }
}

/// External media toolchain configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Limit per external command in seconds, 0 disables it
    #[serde(default = "default_media_timeout_secs")]
    pub timeout_secs: u64,

    /// Parent directory for per-run scratch directories
    #[serde(default)]
    pub work_dir: Option<String>,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Encoder preset for re-encoded passes
    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_media_timeout_secs(),
            work_dir: None,
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            preset: default_preset(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "ko".to_string()
}

fn default_repeat_count() -> usize {
    3
}

fn default_subtitle_modes() -> Vec<String> {
    vec![
        "no_subtitle".to_string(),
        "source_target".to_string(),
        "source_target".to_string(),
    ]
}

fn default_font() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    48
}

fn default_true() -> bool {
    true
}

fn default_primary_color() -> String {
    "#FFFFFF".to_string()
}

fn default_outline_color() -> String {
    "#000000".to_string()
}

fn default_background_color() -> String {
    "#00000080".to_string()
}

fn default_interlude_duration() -> f64 {
    2.0
}

fn default_interlude_width() -> u32 {
    1920
}

fn default_interlude_height() -> u32 {
    1080
}

fn default_interlude_background() -> String {
    "black".to_string()
}

fn default_interlude_font_color() -> String {
    "white".to_string()
}

fn default_interlude_font_size() -> u32 {
    72
}

fn default_voice() -> String {
    "en-US-GuyNeural".to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "tts-1".to_string()
}

fn default_edge_tts_command() -> String {
    "edge-tts".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_media_timeout_secs() -> u64 {
    600
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

/// Split a `#RRGGBB` or `#RRGGBBAA` colour into its channels
///
/// Alpha defaults to `FF` (opaque) when omitted.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 0xFF };
    Some((channel(0)?, channel(2)?, channel(4)?, alpha))
}

/// Whether ffmpeg's colour syntax accepts the value (a name or hex form)
fn is_ffmpeg_color(color: &str) -> bool {
    let color = color.trim();
    parse_hex_color(color).is_some()
        || (!color.is_empty() && color.chars().all(|c| c.is_ascii_alphabetic()))
}

impl Config {
    /// Caption modes for every configured token, in order
    pub fn resolve_modes(&self) -> Result<Vec<SubtitleMode>, GenerationError> {
        self.repeat
            .subtitle_modes
            .iter()
            .map(|token| SubtitleMode::parse_token(token, &self.source_language, &self.target_language))
            .collect()
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), GenerationError> {
        // Validate languages
        for code in [&self.source_language, &self.target_language] {
            language_utils::validate_language_code(code)
                .map_err(|e| GenerationError::config(e.to_string()))?;
        }

        if self.repeat.repeat_count < 1 {
            return Err(GenerationError::config(format!(
                "repeat_count must be at least 1, got {}",
                self.repeat.repeat_count
            )));
        }
        self.resolve_modes()?;

        let style = &self.subtitle_style;
        if style.font.trim().is_empty() {
            return Err(GenerationError::config("subtitle_style.font must not be empty"));
        }
        if style.font_size == 0 {
            return Err(GenerationError::config("subtitle_style.font_size must be positive"));
        }
        for (name, value) in [
            ("primary_color", &style.primary_color),
            ("outline_color", &style.outline_color),
            ("background_color", &style.background_color),
        ] {
            if parse_hex_color(value).is_none() {
                return Err(GenerationError::config(format!(
                    "subtitle_style.{} must be #RRGGBB or #RRGGBBAA, got '{}'",
                    name, value
                )));
            }
        }

        let interlude = &self.interlude;
        if !(interlude.duration_secs > 0.0 && interlude.duration_secs.is_finite()) {
            return Err(GenerationError::config("interlude.duration_secs must be positive"));
        }
        if interlude.width == 0 || interlude.height == 0 || interlude.font_size == 0 {
            return Err(GenerationError::config(
                "interlude width, height and font_size must be positive",
            ));
        }
        for value in [&interlude.background_color, &interlude.font_color] {
            if !is_ffmpeg_color(value) {
                return Err(GenerationError::config(format!(
                    "Invalid interlude colour: '{}'",
                    value
                )));
            }
        }

        if let Some(tts) = &self.tts {
            if tts.voice.trim().is_empty() {
                return Err(GenerationError::config("tts.voice must not be empty"));
            }
            if !(tts.speed > 0.0 && tts.speed <= 4.0) {
                return Err(GenerationError::config(format!(
                    "tts.speed must be in (0, 4], got {}",
                    tts.speed
                )));
            }
            match tts.provider {
                TtsProvider::OpenAI => {
                    if tts.api_key.is_empty() {
                        return Err(GenerationError::config(
                            "tts.api_key is required for the OpenAI provider",
                        ));
                    }
                    Url::parse(&tts.endpoint).map_err(|e| {
                        GenerationError::config(format!("Invalid tts.endpoint '{}': {}", tts.endpoint, e))
                    })?;
                }
                TtsProvider::EdgeTts => {
                    if tts.command.trim().is_empty() {
                        return Err(GenerationError::config("tts.command must not be empty"));
                    }
                }
            }
        }

        if self.media.ffmpeg_path.trim().is_empty() || self.media.ffprobe_path.trim().is_empty() {
            return Err(GenerationError::config("media.ffmpeg_path and media.ffprobe_path are required"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            repeat: RepeatConfig::default(),
            subtitle_style: SubtitleStyle::default(),
            interlude: InterludeConfig::default(),
            tts: None,
            media: MediaConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
