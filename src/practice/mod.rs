/*!
 * Repetition planning and caption transformation.
 *
 * Everything in this module is pure: it decides what each pass of a
 * practice video shows, but never touches the filesystem or external tools.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;
use crate::language_utils;

pub mod lookup;
pub mod planner;
pub mod transformer;

pub use lookup::TranslationLookup;
pub use planner::{FocusInterlude, PassSpec, RepetitionPlan};
pub use transformer::transform_cues;

/// Caption configuration of a single pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubtitleMode {
    /// No captions; the clip is stream-copied
    None,
    /// Source-language text only
    Source,
    /// Translation only, falling back to the source text
    Target,
    /// Source text with the translation on a second line
    SourceAndTarget,
}

impl SubtitleMode {
    /// Parse a mode token
    ///
    /// Besides the keyword tokens, language codes are resolved against the
    /// configured languages: with `en`→`ko`, "en" is `Source`, "ko" is
    /// `Target` and "en_ko" is `SourceAndTarget`.
    pub fn parse_token(token: &str, source_language: &str, target_language: &str) -> Result<Self, GenerationError> {
        let normalized = token.trim().to_lowercase();

        match normalized.as_str() {
            "no_subtitle" | "none" => return Ok(Self::None),
            "source" => return Ok(Self::Source),
            "target" => return Ok(Self::Target),
            "source_target" | "source_and_target" => return Ok(Self::SourceAndTarget),
            _ => {}
        }

        if let Some((first, second)) = language_utils::split_language_pair(&normalized) {
            if language_utils::language_codes_match(&first, source_language)
                && language_utils::language_codes_match(&second, target_language)
            {
                return Ok(Self::SourceAndTarget);
            }
        } else if language_utils::language_codes_match(&normalized, source_language) {
            return Ok(Self::Source);
        } else if language_utils::language_codes_match(&normalized, target_language) {
            return Ok(Self::Target);
        }

        Err(GenerationError::config(format!(
            "Unknown subtitle mode '{}' for languages {}->{}",
            token, source_language, target_language
        )))
    }

    /// Keyword token for this mode
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::None => "no_subtitle",
            Self::Source => "source",
            Self::Target => "target",
            Self::SourceAndTarget => "source_target",
        }
    }

    pub fn shows_captions(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for SubtitleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}
