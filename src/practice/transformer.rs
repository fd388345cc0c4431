use crate::practice::{SubtitleMode, TranslationLookup};
use crate::subtitle_processor::Cue;

/// Translation for a cue: its own `translated_text` first, then the lookup
fn translation_for<'a>(cue: &'a Cue, lookup: Option<&'a TranslationLookup>) -> Option<&'a str> {
    cue.translated_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| lookup.and_then(|l| l.get(&cue.source_text)))
}

/// True when `text` already ends with `translation` on its own line
fn is_combined(text: &str, translation: &str) -> bool {
    let mut lines = text.lines().rev();
    match (lines.next(), lines.next()) {
        (Some(last), Some(_)) => last.trim() == translation,
        _ => false,
    }
}

/// Rewrite cue text for a pass mode
///
/// Returns new cues and leaves the input untouched. The translation used is
/// recorded in each output cue's `translated_text`, which makes the function
/// idempotent per mode.
pub fn transform_cues(cues: &[Cue], mode: SubtitleMode, lookup: Option<&TranslationLookup>) -> Vec<Cue> {
    match mode {
        SubtitleMode::None => Vec::new(),
        SubtitleMode::Source => cues.to_vec(),
        SubtitleMode::Target => cues
            .iter()
            .map(|cue| match translation_for(cue, lookup) {
                Some(translation) => rewrite(cue, translation.to_string(), translation),
                None => cue.clone(),
            })
            .collect(),
        SubtitleMode::SourceAndTarget => cues
            .iter()
            .map(|cue| match translation_for(cue, lookup) {
                Some(translation) if is_combined(&cue.source_text, translation) => cue.clone(),
                Some(translation) => {
                    let text = format!("{}\n{}", cue.source_text, translation);
                    rewrite(cue, text, translation)
                }
                None => cue.clone(),
            })
            .collect(),
    }
}

fn rewrite(cue: &Cue, text: String, translation: &str) -> Cue {
    Cue {
        index: cue.index,
        start_ms: cue.start_ms,
        end_ms: cue.end_ms,
        source_text: text,
        translated_text: Some(translation.to_string()),
    }
}
