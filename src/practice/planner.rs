use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;
use crate::practice::SubtitleMode;
use crate::subtitle_processor::Cue;

/// Messages cycled through when none are configured
pub const DEFAULT_FOCUS_MESSAGES: [&str; 2] = ["Focus again!", "Do you remember?"];

/// One pass over the clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSpec {
    /// Zero-based position in the output
    pub pass_index: usize,

    /// Captions shown during this pass
    pub mode: SubtitleMode,

    /// Replace this pass's audio with synthesized speech
    pub synthesize_audio: bool,
}

/// Interlude shown after a non-final pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusInterlude {
    /// Pass this interlude follows
    pub after_pass: usize,
    pub message: String,
}

/// Ordered passes for one practice video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepetitionPlan {
    pub passes: Vec<PassSpec>,
}

impl RepetitionPlan {
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// The pass flagged for speech synthesis, if any
    pub fn audio_pass(&self) -> Option<&PassSpec> {
        self.passes.iter().find(|pass| pass.synthesize_audio)
    }

    /// Passes plus the interludes between them
    pub fn unit_count(&self) -> usize {
        (self.passes.len() * 2).saturating_sub(1)
    }

    /// Interludes between consecutive passes, never after the last
    pub fn interludes(&self, messages: &[String]) -> Vec<FocusInterlude> {
        self.passes
            .iter()
            .take(self.passes.len().saturating_sub(1))
            .map(|pass| FocusInterlude {
                after_pass: pass.pass_index,
                message: focus_message(messages, pass.pass_index),
            })
            .collect()
    }
}

/// Message for the interlude after `pass_index`
///
/// Blank entries are skipped; an empty list falls back to the default pair.
pub fn focus_message(messages: &[String], pass_index: usize) -> String {
    let usable: Vec<&str> = messages
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();

    if usable.is_empty() {
        DEFAULT_FOCUS_MESSAGES[pass_index % DEFAULT_FOCUS_MESSAGES.len()].to_string()
    } else {
        usable[pass_index % usable.len()].to_string()
    }
}

/// Build the pass list for a run
///
/// `modes` shorter than `repeat_count` is padded with its last entry, or with
/// `SourceAndTarget` when empty. Only pass 0 synthesizes audio, and only when
/// speech synthesis is configured.
pub fn plan(
    cues: &[Cue],
    repeat_count: usize,
    modes: &[SubtitleMode],
    tts_configured: bool,
) -> Result<RepetitionPlan, GenerationError> {
    if repeat_count < 1 {
        return Err(GenerationError::config(format!(
            "repeat count must be at least 1, got {}",
            repeat_count
        )));
    }

    let padding = modes.last().copied().unwrap_or(SubtitleMode::SourceAndTarget);
    let passes: Vec<PassSpec> = (0..repeat_count)
        .map(|pass_index| PassSpec {
            pass_index,
            mode: modes.get(pass_index).copied().unwrap_or(padding),
            synthesize_audio: tts_configured && pass_index == 0,
        })
        .collect();

    let needs_cues = tts_configured || passes.iter().any(|pass| pass.mode.shows_captions());
    if cues.is_empty() && needs_cues {
        return Err(GenerationError::config(
            "caption track has no cues but the plan shows captions or synthesizes speech",
        ));
    }

    if modes.len() > repeat_count {
        debug!(
            "Ignoring {} mode entries beyond repeat count {}",
            modes.len() - repeat_count,
            repeat_count
        );
    }

    Ok(RepetitionPlan { passes })
}
