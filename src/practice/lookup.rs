use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;

use crate::errors::GenerationError;

/// Map from source caption text to its translation
///
/// Keys and values are stored trimmed, and lookups trim their argument, so
/// captions that differ only by surrounding whitespace share a translation.
#[derive(Debug, Clone, Default)]
pub struct TranslationLookup {
    entries: HashMap<String, String>,
}

impl TranslationLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(source, translation)` pairs
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut lookup = Self::new();
        for (source, translation) in pairs {
            lookup.insert(source.as_ref(), translation.as_ref());
        }
        lookup
    }

    /// Load a JSON object of `"source text": "translation"` entries
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, GenerationError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GenerationError::MissingResource(format!(
                "Translation file does not exist: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let map: HashMap<String, String> = serde_json::from_str(&content).map_err(|e| {
            GenerationError::config(format!("Invalid translation file {}: {}", path.display(), e))
        })?;

        let lookup = Self::from_pairs(map);
        debug!("Loaded {} translations from {}", lookup.len(), path.display());
        Ok(lookup)
    }

    /// Add an entry; blank sources or translations are ignored
    pub fn insert(&mut self, source: &str, translation: &str) {
        let source = source.trim();
        let translation = translation.trim();
        if source.is_empty() || translation.is_empty() {
            return;
        }
        self.entries.insert(source.to_string(), translation.to_string());
    }

    /// Translation for a caption text
    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
