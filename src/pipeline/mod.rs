/*!
 * Practice video assembly.
 *
 * - `renderer`: one video per repetition pass
 * - `interlude`: focus messages between passes
 * - `audio_overlay`: synthesized speech over the first pass
 * - `concat`: joins the units into the output
 * - `lifecycle`: scratch files of a run
 * - `orchestrator`: drives a run through its states
 */

pub mod audio_overlay;
pub mod concat;
pub mod interlude;
pub mod lifecycle;
pub mod orchestrator;
pub mod renderer;

pub use audio_overlay::{AudioOverlayPlan, AudioOverlaySynthesizer, CueClip};
pub use lifecycle::{ResourceRegistry, TempResource};
pub use orchestrator::{
    GenerationRequest, GenerationResult, PipelineProgress, PipelineRun, PipelineState, PracticePipeline,
    ProgressCallback, RenderedUnit, UnitKind,
};
pub use renderer::SegmentRenderer;
