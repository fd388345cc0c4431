/*!
 * # Shadowreel - repeat practice videos for language shadowing
 *
 * Takes a short video clip and its captions and assembles a longer video
 * that plays the clip several times, each pass with a different caption
 * configuration, separated by short focus messages.
 *
 * ## Features
 *
 * - SRT and WebVTT caption input, optional time-range extraction
 * - Per-pass caption modes: none, source, translation, both
 * - Focus interludes between passes
 * - Synthesized speech aligned to the captions on the first pass:
 *   - edge-tts command line tool
 *   - OpenAI speech API
 * - Background tasks with pollable status
 *
 * ## Architecture
 *
 * - `subtitle_processor`: cue parsing, writing and slicing
 * - `practice`: pass planning, caption transformation, translation lookup
 * - `pipeline`: rendering, interludes, audio overlay, concatenation, run lifecycle
 * - `media`: the transcoder seam and its ffmpeg implementation
 * - `providers`: speech synthesis clients
 * - `session`: task store for background generations
 * - `app_config`, `app_controller`, `file_utils`, `language_utils`, `errors`
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod pipeline;
pub mod practice;
pub mod providers;
pub mod session;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{ErrorKind, GenerationError, ToolError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use pipeline::{GenerationRequest, GenerationResult, PipelineProgress, PipelineState, PracticePipeline};
pub use practice::{SubtitleMode, TranslationLookup};
pub use session::{TaskState, TaskStatus, TaskStore};
pub use subtitle_processor::{ClipRange, Cue, CueTrack};
