use log::{debug, info};
use std::sync::Arc;

use crate::errors::GenerationError;
use crate::media::{DelayedClip, Transcoder};
use crate::pipeline::lifecycle::{ensure_output, ResourceRegistry, TempResource};
use crate::providers::{SpeechSynthesizer, VoiceSettings};
use crate::subtitle_processor::Cue;

/// A cue selected for speech, before synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCue {
    pub cue_index: usize,
    pub delay_ms: u64,
    pub text: String,
}

/// One synthesized clip and where it starts in the pass
#[derive(Debug, Clone, PartialEq)]
pub struct CueClip {
    pub cue_index: usize,
    pub delay_ms: u64,
    pub clip_path: TempResource,
}

/// Speech clips laid over a silent track as long as the pass
#[derive(Debug, Clone, PartialEq)]
pub struct AudioOverlayPlan {
    pub base_duration_seconds: f64,
    pub cue_clips: Vec<CueClip>,
}

impl AudioOverlayPlan {
    pub fn delayed_clips(&self) -> Vec<DelayedClip> {
        self.cue_clips
            .iter()
            .map(|clip| DelayedClip {
                path: clip.clip_path.path().to_path_buf(),
                delay_ms: clip.delay_ms,
            })
            .collect()
    }
}

/// Pick the cues to speak and their offsets
///
/// Every cue with non-blank text starting inside the base track is kept and
/// delayed by its start time. Speech may overlap the next cue; anything past
/// the end of the base is cut off by the mix.
pub fn schedule(cues: &[Cue], base_duration_seconds: f64) -> Vec<ScheduledCue> {
    let base_ms = (base_duration_seconds.max(0.0) * 1000.0).round() as u64;

    cues.iter()
        .filter(|cue| !cue.source_text.trim().is_empty())
        .filter(|cue| {
            let inside = cue.start_ms <= base_ms;
            if !inside {
                debug!(
                    "Cue {} starts at {}ms, after the {}ms base track; not spoken",
                    cue.index, cue.start_ms, base_ms
                );
            }
            inside
        })
        .map(|cue| ScheduledCue {
            cue_index: cue.index,
            delay_ms: cue.start_ms,
            text: cue.source_text.replace('\n', " ").trim().to_string(),
        })
        .collect()
}

/// Replaces a pass's audio with speech aligned to its captions
pub struct AudioOverlaySynthesizer<'a> {
    transcoder: &'a dyn Transcoder,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice: VoiceSettings,
}

impl<'a> AudioOverlaySynthesizer<'a> {
    pub fn new(transcoder: &'a dyn Transcoder, synthesizer: Arc<dyn SpeechSynthesizer>, voice: VoiceSettings) -> Self {
        Self {
            transcoder,
            synthesizer,
            voice,
        }
    }

    /// Synthesize every scheduled cue into the run directory
    pub async fn build_plan(
        &self,
        registry: &mut ResourceRegistry,
        cues: &[Cue],
        base_duration_seconds: f64,
    ) -> Result<AudioOverlayPlan, GenerationError> {
        let scheduled = schedule(cues, base_duration_seconds);
        let mut cue_clips = Vec::with_capacity(scheduled.len());

        for cue in scheduled {
            let target = registry.allocate(
                &format!("tts_cue{}", cue.cue_index),
                self.synthesizer.file_extension(),
            );
            let written = self
                .synthesizer
                .synthesize(&cue.text, &self.voice, target.path())
                .await?;
            let clip_path = registry.register(written);
            ensure_output(clip_path.path())?;

            cue_clips.push(CueClip {
                cue_index: cue.cue_index,
                delay_ms: cue.delay_ms,
                clip_path,
            });
        }

        Ok(AudioOverlayPlan {
            base_duration_seconds,
            cue_clips,
        })
    }

    /// Run the whole overlay for `pass_video`
    ///
    /// Returns the re-muxed video, or `None` when no cue falls inside the pass.
    pub async fn apply(
        &self,
        registry: &mut ResourceRegistry,
        pass_video: &TempResource,
        cues: &[Cue],
    ) -> Result<Option<TempResource>, GenerationError> {
        let base_duration = self.transcoder.probe_duration(pass_video.path()).await?;
        let plan = self.build_plan(registry, cues, base_duration).await?;
        if plan.cue_clips.is_empty() {
            return Ok(None);
        }
        info!(
            "Synthesized {} speech clip(s) with {} for a {:.2}s pass",
            plan.cue_clips.len(),
            self.synthesizer.name(),
            base_duration
        );

        let silence = registry.allocate("tts_base", "wav");
        self.transcoder
            .render_silence(plan.base_duration_seconds, silence.path())
            .await?;
        ensure_output(silence.path())?;

        let mixed = registry.allocate("tts_mix", "wav");
        self.transcoder
            .mix_delayed(silence.path(), &plan.delayed_clips(), mixed.path())
            .await?;
        ensure_output(mixed.path())?;

        let voiced = registry.allocate("pass0_voiced", "mp4");
        self.transcoder
            .replace_audio(pass_video.path(), mixed.path(), voiced.path())
            .await?;
        ensure_output(voiced.path())?;

        Ok(Some(voiced))
    }
}
