use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use std::fs::OpenOptions;
use std::io::Write;
use chrono::Local;

// @module: File and directory utilities

/// Suffix added to the stem of generated practice videos
pub const PRACTICE_SUFFIX: &str = "practice";

/// Video extensions picked up in folder mode
pub const VIDEO_EXTENSIONS: [&str; 10] = [
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg",
];

/// Caption extensions accepted next to a video, in preference order
pub const CAPTION_EXTENSIONS: [&str; 2] = ["srt", "vtt"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Output path for the practice video of `input_file`
    ///
    /// `clip.mp4` becomes `<output_dir>/clip.practice.mp4`.
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(input_file: P1, output_dir: P2) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();
        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(PRACTICE_SUFFIX);
        output_filename.push_str(".mp4");
        output_dir.as_ref().join(output_filename)
    }

    /// Whether `path` looks like a video this tool generated
    pub fn is_practice_output<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_stem()
            .and_then(|stem| Path::new(stem).extension())
            .is_some_and(|ext| ext == PRACTICE_SUFFIX)
    }

    /// Caption file next to a video
    ///
    /// Looks for `<stem>.srt` then `<stem>.vtt`, then for language-tagged
    /// names such as `<stem>.en.srt` using `language`.
    pub fn find_caption_for<P: AsRef<Path>>(video: P, language: Option<&str>) -> Option<PathBuf> {
        let video = video.as_ref();
        let stem = video.file_stem()?.to_string_lossy().to_string();
        let dir = video.parent().unwrap_or_else(|| Path::new(""));

        let mut candidates: Vec<PathBuf> = CAPTION_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext)))
            .collect();
        if let Some(lang) = language {
            candidates.extend(
                CAPTION_EXTENSIONS
                    .iter()
                    .map(|ext| dir.join(format!("{}.{}.{}", stem, lang, ext))),
            );
        }

        candidates.into_iter().find(|candidate| candidate.is_file())
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized_ext = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(normalized_ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        Ok(result)
    }

    /// Every source video under `dir`, sorted, excluding generated outputs
    pub fn find_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut videos = Vec::new();
        for ext in VIDEO_EXTENSIONS {
            videos.extend(
                Self::find_files(dir.as_ref(), ext)?
                    .into_iter()
                    .filter(|path| !Self::is_practice_output(path)),
            );
        }
        videos.sort();
        Ok(videos)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Classify a file by extension, falling back to its contents
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();
            if CAPTION_EXTENSIONS.contains(&ext_str.as_str()) {
                return Ok(FileType::Caption);
            }
            if VIDEO_EXTENSIONS.contains(&ext_str.as_str()) {
                return Ok(FileType::Video);
            }
        }

        // Caption files are small text; anything with a cue arrow counts
        if let Ok(content) = fs::read_to_string(path) {
            if content.trim_start_matches('\u{feff}').starts_with("WEBVTT") || content.contains("-->") {
                return Ok(FileType::Caption);
            }
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// SRT or WebVTT captions
    Caption,
    /// Video file supported by ffmpeg
    Video,
    /// Unknown file type
    Unknown,
}
