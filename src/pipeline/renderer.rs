use log::debug;
use std::path::Path;

use crate::app_config::{parse_hex_color, SubtitleStyle};
use crate::errors::GenerationError;
use crate::media::Transcoder;
use crate::pipeline::lifecycle::{ensure_output, ResourceRegistry, TempResource};
use crate::practice::PassSpec;
use crate::subtitle_processor::{ClipRange, Cue, CueTrack};

/// `#RRGGBB[AA]` as an ASS `&HAABBGGRR` colour
///
/// ASS alpha runs the other way: `00` is opaque. Unparseable input yields
/// opaque black.
pub fn ass_color(color: &str) -> String {
    let (r, g, b, a) = parse_hex_color(color).unwrap_or((0, 0, 0, 0xFF));
    format!("&H{:02X}{:02X}{:02X}{:02X}", 255 - a, b, g, r)
}

/// ASS style override for the `subtitles` filter
pub fn force_style(style: &SubtitleStyle) -> String {
    [
        format!("FontName={}", style.font),
        format!("FontSize={}", style.font_size),
        format!("PrimaryColour={}", ass_color(&style.primary_color)),
        format!("OutlineColour={}", ass_color(&style.outline_color)),
        format!("BackColour={}", ass_color(&style.background_color)),
        "BorderStyle=1".to_string(),
        "Outline=1".to_string(),
        format!("Shadow={}", if style.shadow { 1 } else { 0 }),
        "Alignment=2".to_string(),
        format!("MarginL={}", style.position.x),
        format!("MarginV={}", style.position.y),
    ]
    .join(",")
}

/// Produces one video file per pass
pub struct SegmentRenderer<'a> {
    transcoder: &'a dyn Transcoder,
    force_style: String,
}

impl<'a> SegmentRenderer<'a> {
    pub fn new(transcoder: &'a dyn Transcoder, style: &SubtitleStyle) -> Self {
        Self {
            transcoder,
            force_style: force_style(style),
        }
    }

    /// Cut `range` out of `source` into a scratch clip
    pub async fn extract_clip(
        &self,
        registry: &mut ResourceRegistry,
        source: &Path,
        range: ClipRange,
    ) -> Result<TempResource, GenerationError> {
        let clip = registry.allocate("clip", "mp4");
        debug!(
            "Extracting {}..{} from {}",
            Cue::format_timestamp(range.start_ms),
            Cue::format_timestamp(range.end_ms),
            source.display()
        );
        self.transcoder.extract_range(source, range, clip.path()).await?;
        ensure_output(clip.path())?;
        Ok(clip)
    }

    /// Render one pass from already-transformed cues
    ///
    /// Passes without captions are stream-copied; the rest get the cues
    /// burned in through a scratch SRT file.
    pub async fn render_pass(
        &self,
        registry: &mut ResourceRegistry,
        clip: &Path,
        pass: &PassSpec,
        cues: &[Cue],
    ) -> Result<TempResource, GenerationError> {
        if !clip.is_file() {
            return Err(GenerationError::MissingResource(format!(
                "Source clip does not exist: {}",
                clip.display()
            )));
        }

        let output = registry.allocate(&format!("pass{}", pass.pass_index), "mp4");

        if !pass.mode.shows_captions() || cues.is_empty() {
            debug!("Pass {}: stream copy", pass.pass_index);
            self.transcoder.stream_copy(clip, output.path()).await?;
        } else {
            let captions = registry.allocate(&format!("pass{}_captions", pass.pass_index), "srt");
            CueTrack::write_srt(cues, captions.path())?;
            debug!(
                "Pass {}: burning {} cue(s) in {} mode",
                pass.pass_index,
                cues.len(),
                pass.mode
            );
            self.transcoder
                .burn_captions(clip, captions.path(), &self.force_style, output.path())
                .await?;
        }

        ensure_output(output.path())?;
        Ok(output)
    }
}
