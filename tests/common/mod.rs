/*!
 * Common test utilities for the shadowreel test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use shadowreel::app_config::Config;
use shadowreel::media::{MockTranscoder, Transcoder};
use shadowreel::pipeline::PracticePipeline;
use shadowreel::providers::{MockSynthesizer, SpeechSynthesizer};

/// Route library logs to the test output; set RUST_LOG to see them
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
"#;
    create_test_file(dir, filename, content)
}

/// Single cue "Hello" from 0 to 2 seconds
pub fn create_hello_subtitle(dir: &Path) -> Result<PathBuf> {
    create_test_file(dir, "hello.srt", "1\n00:00:00,000 --> 00:00:02,000\nHello\n")
}

/// Placeholder clip; the mock transcoder only needs it to exist
pub fn create_test_clip(dir: &Path, filename: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, b"not really a video")?;
    Ok(file_path)
}

/// Config with two passes (`no_subtitle`, `en`) and scratch files under `work_dir`
pub fn test_config(work_dir: &Path) -> Config {
    let mut config = Config::default();
    config.repeat.repeat_count = 2;
    config.repeat.subtitle_modes = vec!["no_subtitle".to_string(), "en".to_string()];
    config.media.work_dir = Some(work_dir.to_string_lossy().to_string());
    config
}

/// Pipeline over the given test doubles
pub fn mock_pipeline(
    config: Config,
    transcoder: &Arc<MockTranscoder>,
    synthesizer: Option<&MockSynthesizer>,
) -> PracticePipeline {
    let transcoder: Arc<dyn Transcoder> = transcoder.clone();
    let synthesizer = synthesizer.map(|s| Arc::new(s.clone()) as Arc<dyn SpeechSynthesizer>);
    PracticePipeline::new(config, transcoder, synthesizer)
}

/// Files left in a directory, recursively
pub fn remaining_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect()
}
