use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use once_cell::sync::Lazy;
use regex::Regex;
use log::{debug, warn};
use crate::errors::GenerationError;

// @module: Caption track parsing, writing and slicing

// @const: Cue timing line, SRT (comma) or WebVTT (dot, optional hours)
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(\d+):)?(\d{1,2}):(\d{2})[,.](\d{3})\s*-->\s*(?:(\d+):)?(\d{1,2}):(\d{2})[,.](\d{3})",
    )
    .unwrap()
});

// @const: Inline WebVTT markup such as <c.yellow> or <00:00:01.200>
static VTT_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

// @struct: Single caption entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: 1-based position in source order
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Caption text in the source language
    pub source_text: String,

    // @field: Translation carried by the caption file itself, if any
    pub translated_text: Option<String>,
}

impl Cue {
    /// Creates a new cue without a translation
    pub fn new(index: usize, start_ms: u64, end_ms: u64, source_text: impl Into<String>) -> Self {
        Cue {
            index,
            start_ms,
            end_ms,
            source_text: source_text.into(),
            translated_text: None,
        }
    }

    // @creates: Validated cue
    // @validates: Time range and non-empty text
    pub fn new_validated(index: usize, start_ms: u64, end_ms: u64, text: &str) -> Result<Self, String> {
        if end_ms <= start_ms {
            return Err(format!(
                "Invalid time range: end time {} <= start time {}",
                end_ms, start_ms
            ));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(format!("Empty caption text for cue {}", index));
        }

        Ok(Cue::new(index, start_ms, end_ms, trimmed_text))
    }

    /// Attach a translation to the cue
    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translated_text = Some(translation.into());
        self
    }

    /// Start offset in seconds
    pub fn start_seconds(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Parse a timestamp to milliseconds
    ///
    /// Accepts `HH:MM:SS,mmm`, `HH:MM:SS.mmm`, `MM:SS.mmm` and plain seconds
    /// such as `62.5`.
    pub fn parse_timestamp(timestamp: &str) -> Option<u64> {
        let timestamp = timestamp.trim();
        if !timestamp.contains(':') {
            let seconds: f64 = timestamp.replace(',', ".").parse().ok()?;
            let ms = (seconds * 1000.0).round();
            if ms < 0.0 || !ms.is_finite() || ms >= u64::MAX as f64 {
                return None;
            }
            return Some(ms as u64);
        }

        let (clock, millis) = match timestamp.rsplit_once([',', '.']) {
            Some((clock, millis)) => (clock, millis),
            None => (timestamp, "0"),
        };
        if millis.len() > 3 {
            return None;
        }
        let millis: u64 = format!("{:0<3}", millis).parse().ok()?;

        let parts: Vec<&str> = clock.split(':').collect();
        let (hours, minutes, seconds): (u64, u64, u64) = match parts.as_slice() {
            [h, m, s] => (h.parse().ok()?, m.parse().ok()?, s.parse().ok()?),
            [m, s] => (0, m.parse().ok()?, s.parse().ok()?),
            _ => return None,
        };

        if minutes >= 60 || seconds >= 60 {
            return None;
        }

        clock_to_ms(hours, minutes, seconds, millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

/// `None` when the total does not fit in a `u64`
fn clock_to_ms(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes.checked_mul(60_000)?)?
        .checked_add(seconds.checked_mul(1_000)?)?
        .checked_add(millis)
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_ms),
            Self::format_timestamp(self.end_ms)
        )?;
        writeln!(f, "{}", self.source_text)?;
        writeln!(f)
    }
}

/// Inclusive-exclusive time window inside a longer source video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl ClipRange {
    pub fn new(start_ms: u64, end_ms: u64) -> Result<Self, GenerationError> {
        if end_ms <= start_ms {
            return Err(GenerationError::config(format!(
                "Clip range end ({}) must be after its start ({})",
                Cue::format_timestamp(end_ms),
                Cue::format_timestamp(start_ms)
            )));
        }
        Ok(Self { start_ms, end_ms })
    }

    /// Parse from two user-supplied timestamps
    pub fn parse(start: &str, end: &str) -> Result<Self, GenerationError> {
        let start_ms = Cue::parse_timestamp(start)
            .ok_or_else(|| GenerationError::config(format!("Invalid start timestamp: {}", start)))?;
        let end_ms = Cue::parse_timestamp(end)
            .ok_or_else(|| GenerationError::config(format!("Invalid end timestamp: {}", end)))?;
        Self::new(start_ms, end_ms)
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn end_seconds(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }
}

/// Caption track loaded from an SRT or WebVTT file
#[derive(Debug, Clone)]
pub struct CueTrack {
    /// File the cues were read from
    pub source_file: PathBuf,

    /// Cues ordered by start time
    pub cues: Vec<Cue>,
}

impl CueTrack {
    pub fn new(source_file: PathBuf, cues: Vec<Cue>) -> Self {
        CueTrack { source_file, cues }
    }

    /// Load a caption file, picking the format from extension or header
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GenerationError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GenerationError::MissingResource(format!(
                "Caption file does not exist: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let is_vtt = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("vtt"))
            || content.trim_start_matches('\u{feff}').starts_with("WEBVTT");

        let cues = if is_vtt {
            Self::parse_vtt_string(&content)
        } else {
            Self::parse_srt_string(&content)
        };

        debug!("Loaded {} cues from {}", cues.len(), path.display());
        Ok(CueTrack::new(path.to_path_buf(), cues))
    }

    /// Parse SRT content into cues
    ///
    /// Malformed blocks are skipped with a warning; the result is sorted by
    /// start time and renumbered from 1.
    pub fn parse_srt_string(content: &str) -> Vec<Cue> {
        Self::parse_blocks(content, false)
    }

    /// Parse WebVTT content into cues, dropping inline markup and cue settings
    pub fn parse_vtt_string(content: &str) -> Vec<Cue> {
        Self::parse_blocks(content, true)
    }

    fn parse_blocks(content: &str, strip_markup: bool) -> Vec<Cue> {
        let content = content.trim_start_matches('\u{feff}');
        let mut cues = Vec::new();
        let mut block: Vec<&str> = Vec::new();

        for line in content.lines().chain(std::iter::once("")) {
            let line = line.trim_end();
            if !line.trim().is_empty() {
                block.push(line);
                continue;
            }
            if block.is_empty() {
                continue;
            }

            if let Some(cue) = Self::parse_block(&block, cues.len() + 1, strip_markup) {
                cues.push(cue);
            }
            block.clear();
        }

        cues.sort_by_key(|cue| cue.start_ms);
        for (i, cue) in cues.iter_mut().enumerate() {
            cue.index = i + 1;
        }

        let overlap_count = cues
            .windows(2)
            .filter(|pair| pair[0].end_ms > pair[1].start_ms)
            .count();
        if overlap_count > 0 {
            debug!("Found {} overlapping cues", overlap_count);
        }

        cues
    }

    fn parse_block(block: &[&str], position: usize, strip_markup: bool) -> Option<Cue> {
        // Header, NOTE, STYLE and REGION blocks carry no timing line
        let timing_at = block.iter().position(|line| line.contains("-->"))?;
        let Some(caps) = TIMING_REGEX.captures(block[timing_at].trim()) else {
            warn!("Skipping cue {} with invalid timing: {}", position, block[timing_at]);
            return None;
        };

        let (Some(start_ms), Some(end_ms)) = (Self::captured_ms(&caps, 1), Self::captured_ms(&caps, 5)) else {
            warn!("Skipping cue {} with out-of-range timing: {}", position, block[timing_at]);
            return None;
        };

        let text = block[timing_at + 1..]
            .iter()
            .map(|line| {
                if strip_markup {
                    VTT_TAG_REGEX.replace_all(line.trim(), "").to_string()
                } else {
                    line.trim().to_string()
                }
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        match Cue::new_validated(position, start_ms, end_ms, &text) {
            Ok(cue) => Some(cue),
            Err(e) => {
                warn!("Skipping invalid cue {}: {}", position, e);
                None
            }
        }
    }

    fn captured_ms(caps: &regex::Captures, start_idx: usize) -> Option<u64> {
        let field = |offset: usize| -> Option<u64> {
            caps.get(start_idx + offset)
                .map_or(Some(0), |m| m.as_str().parse().ok())
        };
        clock_to_ms(field(0)?, field(1)?, field(2)?, field(3)?)
    }

    /// Render cues as SRT text
    pub fn to_srt_string(cues: &[Cue]) -> String {
        cues.iter().map(|cue| cue.to_string()).collect()
    }

    /// Write cues to an SRT file
    pub fn write_srt<P: AsRef<Path>>(cues: &[Cue], path: P) -> std::io::Result<()> {
        fs::write(path, Self::to_srt_string(cues))
    }

    /// Cues falling inside `range`, shifted so the range start becomes zero
    ///
    /// Cues straddling a boundary are clamped to it.
    pub fn slice(&self, range: ClipRange) -> Vec<Cue> {
        let mut sliced: Vec<Cue> = self
            .cues
            .iter()
            .filter(|cue| cue.end_ms > range.start_ms && cue.start_ms < range.end_ms)
            .map(|cue| Cue {
                index: cue.index,
                start_ms: cue.start_ms.max(range.start_ms) - range.start_ms,
                end_ms: cue.end_ms.min(range.end_ms) - range.start_ms,
                source_text: cue.source_text.clone(),
                translated_text: cue.translated_text.clone(),
            })
            .collect();

        for (i, cue) in sliced.iter_mut().enumerate() {
            cue.index = i + 1;
        }
        sliced
    }
}

impl fmt::Display for CueTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Caption Track")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}
