/*!
 * Pipeline orchestrator for assembling practice videos.
 *
 * A run moves through a fixed sequence of states:
 * 1. Planning: load captions and decide the passes
 * 2. RenderingPasses: one video per pass with interludes in between
 * 3. SynthesizingAudio: speech overlay on the first pass (only when configured)
 * 4. Concatenating: join every unit into the output file
 *
 * Any failure moves the run to `Failed` and is reported as a
 * `GenerationResult::Failure`; scratch files are removed either way.
 */

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::{Config, TtsFailurePolicy, TtsTextSource};
use crate::errors::{ErrorKind, GenerationError};
use crate::media::{timeout_from_secs, FfmpegTranscoder, Transcoder};
use crate::pipeline::audio_overlay::AudioOverlaySynthesizer;
use crate::pipeline::concat::concatenate_units;
use crate::pipeline::interlude::render_interlude;
use crate::pipeline::lifecycle::{ResourceRegistry, TempResource};
use crate::pipeline::renderer::SegmentRenderer;
use crate::practice::{planner, transform_cues, SubtitleMode, TranslationLookup};
use crate::providers::{synthesizer_from_config, SpeechSynthesizer, VoiceSettings};
use crate::subtitle_processor::{ClipRange, Cue, CueTrack};

/// States of a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Planning,
    RenderingPasses,
    SynthesizingAudio,
    Concatenating,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Planning => "PLANNING",
            PipelineState::RenderingPasses => "RENDERING_PASSES",
            PipelineState::SynthesizingAudio => "SYNTHESIZING_AUDIO",
            PipelineState::Concatenating => "CONCATENATING",
            PipelineState::Done => "DONE",
            PipelineState::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// Progress information during pipeline execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineProgress {
    /// Current state
    pub state: PipelineState,

    /// Overall progress, never decreasing within a run
    pub percent: u8,

    /// Current status message
    pub message: String,
}

/// Caller-supplied progress sink
pub type ProgressCallback = Box<dyn Fn(PipelineProgress) + Send + Sync>;

/// Clamps reports so the percentage never goes backwards
struct ProgressTracker<'a> {
    sink: Option<&'a (dyn Fn(PipelineProgress) + Send + Sync)>,
    last_percent: u8,
}

impl<'a> ProgressTracker<'a> {
    fn new(sink: Option<&'a (dyn Fn(PipelineProgress) + Send + Sync)>) -> Self {
        Self { sink, last_percent: 0 }
    }

    fn report(&mut self, state: PipelineState, percent: u8, message: impl Into<String>) {
        self.last_percent = self.last_percent.max(percent.min(100));
        if let Some(sink) = self.sink {
            sink(PipelineProgress {
                state,
                percent: self.last_percent,
                message: message.into(),
            });
        }
    }
}

/// Inputs of one generation
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Source video
    pub clip_path: PathBuf,

    /// SRT or WebVTT captions for the clip
    pub caption_path: PathBuf,

    /// Where the practice video is written
    pub output_path: PathBuf,

    /// Translations keyed by caption text
    pub translation: Option<TranslationLookup>,

    /// Practice only this part of the source video
    pub clip_range: Option<ClipRange>,
}

impl GenerationRequest {
    pub fn new(clip_path: impl Into<PathBuf>, caption_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            clip_path: clip_path.into(),
            caption_path: caption_path.into(),
            output_path: output_path.into(),
            translation: None,
            clip_range: None,
        }
    }

    pub fn with_translation(mut self, lookup: TranslationLookup) -> Self {
        self.translation = Some(lookup);
        self
    }

    pub fn with_clip_range(mut self, range: ClipRange) -> Self {
        self.clip_range = Some(range);
        self
    }
}

/// Outcome of a generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationResult {
    Success {
        output_path: PathBuf,
        pass_count: usize,
        total_duration_seconds: f64,
    },
    Failure {
        stage: PipelineState,
        error_kind: ErrorKind,
        message: String,
    },
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    /// Get a summary of the result.
    pub fn summary(&self) -> String {
        match self {
            GenerationResult::Success {
                output_path,
                pass_count,
                total_duration_seconds,
            } => format!(
                "{} pass(es), {:.2}s -> {}",
                pass_count,
                total_duration_seconds,
                output_path.display()
            ),
            GenerationResult::Failure {
                stage,
                error_kind,
                message,
            } => format!("{} at {}: {}", error_kind, stage, message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    Pass,
    Interlude,
}

/// A rendered piece of the output, in playback order
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedUnit {
    pub kind: UnitKind,
    /// The pass this unit shows, or the pass an interlude follows
    pub source_pass_index: Option<usize>,
    pub path: TempResource,
    pub duration_seconds: f64,
}

/// Everything a run produced, for callers that inspect more than the result
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub result: GenerationResult,
    /// Units in concatenation order; their files are gone after the run
    pub units: Vec<RenderedUnit>,
    /// Every scratch path the run registered
    pub temp_resources: Vec<PathBuf>,
    /// The run's scratch directory
    pub work_dir: PathBuf,
}

/// An error tagged with the state it happened in
struct StageError {
    stage: PipelineState,
    error: GenerationError,
}

fn at(stage: PipelineState) -> impl Fn(GenerationError) -> StageError {
    move |error| StageError { stage, error }
}

/// The main practice video pipeline.
#[derive(Debug, Clone)]
pub struct PracticePipeline {
    config: Config,
    transcoder: Arc<dyn Transcoder>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl PracticePipeline {
    /// Create a pipeline with explicit collaborators
    pub fn new(
        config: Config,
        transcoder: Arc<dyn Transcoder>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            config,
            transcoder,
            synthesizer,
        }
    }

    /// Create a pipeline using ffmpeg and the configured speech provider
    pub fn from_config(config: Config) -> Self {
        let timeout = timeout_from_secs(config.media.timeout_secs);
        let transcoder: Arc<dyn Transcoder> = Arc::new(FfmpegTranscoder::from_config(&config.media));
        let synthesizer = config
            .tts
            .as_ref()
            .map(|tts| synthesizer_from_config(tts, timeout));
        Self::new(config, transcoder, synthesizer)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate a practice video
    pub async fn run(
        &self,
        request: GenerationRequest,
        progress: Option<&(dyn Fn(PipelineProgress) + Send + Sync)>,
    ) -> GenerationResult {
        self.run_detailed(request, progress).await.result
    }

    /// Generate a practice video and keep the run's bookkeeping
    pub async fn run_detailed(
        &self,
        request: GenerationRequest,
        progress: Option<&(dyn Fn(PipelineProgress) + Send + Sync)>,
    ) -> PipelineRun {
        let start_time = Instant::now();
        let mut tracker = ProgressTracker::new(progress);
        tracker.report(PipelineState::Planning, 0, "Planning");

        let work_parent = self.config.media.work_dir.as_deref().map(Path::new);
        let mut registry = match ResourceRegistry::new(work_parent) {
            Ok(registry) => registry,
            Err(e) => {
                let failure = StageError {
                    stage: PipelineState::Planning,
                    error: GenerationError::from(e),
                };
                return PipelineRun {
                    result: self.fail(&mut tracker, failure),
                    units: Vec::new(),
                    temp_resources: Vec::new(),
                    work_dir: PathBuf::new(),
                };
            }
        };

        let mut units = Vec::new();
        let outcome = self.execute(&request, &mut registry, &mut tracker, &mut units).await;

        let temp_resources = registry.registered().to_vec();
        let work_dir = registry.root().to_path_buf();
        registry.cleanup();

        let result = match outcome {
            Ok((pass_count, total_duration_seconds)) => {
                tracker.report(PipelineState::Done, 100, "Done");
                info!(
                    "Practice video ready: {} ({} passes, {:.2}s) in {:.1}s",
                    request.output_path.display(),
                    pass_count,
                    total_duration_seconds,
                    start_time.elapsed().as_secs_f64()
                );
                GenerationResult::Success {
                    output_path: request.output_path.clone(),
                    pass_count,
                    total_duration_seconds,
                }
            }
            Err(failure) => self.fail(&mut tracker, failure),
        };

        PipelineRun {
            result,
            units,
            temp_resources,
            work_dir,
        }
    }

    fn fail(&self, tracker: &mut ProgressTracker<'_>, failure: StageError) -> GenerationResult {
        let message = failure.error.to_string();
        error!("Generation failed at {}: {}", failure.stage, message);
        tracker.report(PipelineState::Failed, 0, message.clone());
        GenerationResult::Failure {
            stage: failure.stage,
            error_kind: failure.error.kind(),
            message,
        }
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        registry: &mut ResourceRegistry,
        tracker: &mut ProgressTracker<'_>,
        units: &mut Vec<RenderedUnit>,
    ) -> Result<(usize, f64), StageError> {
        let transcoder = self.transcoder.as_ref();
        let lookup = request.translation.as_ref();

        // Planning
        info!("Planning practice video for {}", request.clip_path.display());
        let planning = at(PipelineState::Planning);
        self.config.validate().map_err(&planning)?;

        let tts = match (&self.config.tts, &self.synthesizer) {
            (Some(tts), Some(synthesizer)) => Some((tts, Arc::clone(synthesizer))),
            (None, _) => None,
            (Some(_), None) => {
                return Err(planning(GenerationError::config(
                    "speech synthesis is configured but no synthesizer is available",
                )));
            }
        };

        let track = CueTrack::from_file(&request.caption_path).map_err(&planning)?;
        let cues: Vec<Cue> = match request.clip_range {
            Some(range) => track.slice(range),
            None => track.cues,
        };
        let modes = self.config.resolve_modes().map_err(&planning)?;
        let plan = planner::plan(&cues, self.config.repeat.repeat_count, &modes, tts.is_some())
            .map_err(&planning)?;
        let interludes = plan.interludes(&self.config.interlude.messages);
        tracker.report(
            PipelineState::Planning,
            5,
            format!("Planned {} pass(es) over {} cue(s)", plan.len(), cues.len()),
        );

        // RenderingPasses
        let rendering = at(PipelineState::RenderingPasses);
        info!("Rendering {} pass(es)", plan.len());
        if !request.clip_path.is_file() {
            return Err(rendering(GenerationError::MissingResource(format!(
                "Source clip does not exist: {}",
                request.clip_path.display()
            ))));
        }

        let renderer = SegmentRenderer::new(transcoder, &self.config.subtitle_style);
        let source_clip: PathBuf = match request.clip_range {
            Some(range) => renderer
                .extract_clip(registry, &request.clip_path, range)
                .await
                .map_err(&rendering)?
                .path()
                .to_path_buf(),
            None => request.clip_path.clone(),
        };

        let total_units = plan.unit_count().max(1);
        let mut first_pass_cues: Vec<Cue> = Vec::new();

        for pass in &plan.passes {
            let transformed = transform_cues(&cues, pass.mode, lookup);
            let path = renderer
                .render_pass(registry, &source_clip, pass, &transformed)
                .await
                .map_err(&rendering)?;
            let duration_seconds = transcoder
                .probe_duration(path.path())
                .await
                .map_err(|e| rendering(e.into()))?;
            units.push(RenderedUnit {
                kind: UnitKind::Pass,
                source_pass_index: Some(pass.pass_index),
                path,
                duration_seconds,
            });
            if pass.pass_index == 0 {
                first_pass_cues = transformed;
            }

            if let Some(interlude) = interludes.iter().find(|i| i.after_pass == pass.pass_index) {
                let path = render_interlude(transcoder, registry, &self.config.interlude, interlude)
                    .await
                    .map_err(&rendering)?;
                let duration_seconds = transcoder
                    .probe_duration(path.path())
                    .await
                    .map_err(|e| rendering(e.into()))?;
                units.push(RenderedUnit {
                    kind: UnitKind::Interlude,
                    source_pass_index: Some(pass.pass_index),
                    path,
                    duration_seconds,
                });
            }

            let percent = 5 + (70 * units.len() / total_units) as u8;
            tracker.report(
                PipelineState::RenderingPasses,
                percent,
                format!("Rendered pass {}/{} ({})", pass.pass_index + 1, plan.len(), pass.mode),
            );
        }

        // SynthesizingAudio
        if let (Some(audio_pass), Some((tts, synthesizer))) = (plan.audio_pass(), tts) {
            let synthesizing = at(PipelineState::SynthesizingAudio);
            tracker.report(PipelineState::SynthesizingAudio, 75, "Synthesizing speech");
            info!("Synthesizing speech for pass {} with {}", audio_pass.pass_index, synthesizer.name());

            let speech_cues = match tts.text_source {
                TtsTextSource::PassMode if audio_pass.mode != SubtitleMode::None => first_pass_cues,
                _ => cues.clone(),
            };

            let unit_index = units
                .iter()
                .position(|u| u.kind == UnitKind::Pass && u.source_pass_index == Some(audio_pass.pass_index))
                .ok_or_else(|| synthesizing(GenerationError::config("audio pass was not rendered")))?;

            let overlay = AudioOverlaySynthesizer::new(transcoder, synthesizer, VoiceSettings::from(tts));
            let pass_video = units[unit_index].path.clone();
            let applied = match overlay.apply(registry, &pass_video, &speech_cues).await {
                Ok(applied) => applied,
                Err(e) => match tts.on_failure {
                    TtsFailurePolicy::Abort => return Err(synthesizing(e)),
                    TtsFailurePolicy::KeepOriginalAudio => {
                        warn!("Speech synthesis failed, keeping original audio: {}", e);
                        None
                    }
                },
            };

            match applied {
                Some(voiced) => {
                    let duration_seconds = transcoder
                        .probe_duration(voiced.path())
                        .await
                        .map_err(|e| synthesizing(e.into()))?;
                    let unit = &mut units[unit_index];
                    unit.path = voiced;
                    unit.duration_seconds = duration_seconds;
                }
                None => warn!("Pass {} keeps its original audio", audio_pass.pass_index),
            }
            tracker.report(PipelineState::SynthesizingAudio, 85, "Speech overlay complete");
        }

        // Concatenating
        let concatenating = at(PipelineState::Concatenating);
        tracker.report(
            PipelineState::Concatenating,
            85,
            format!("Joining {} unit(s)", units.len()),
        );
        let paths: Vec<PathBuf> = units.iter().map(|u| u.path.path().to_path_buf()).collect();
        concatenate_units(transcoder, registry, &paths, &request.output_path)
            .await
            .map_err(&concatenating)?;

        let total_duration_seconds = units.iter().map(|u| u.duration_seconds).sum();
        Ok((plan.len(), total_duration_seconds))
    }
}
