/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;

use shadowreel::file_utils::{FileManager, FileType};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_fileExists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(FileManager::dir_exists(temp_dir.path()));
    Ok(())
}

#[test]
fn test_generateOutputPath_shouldAddPracticeSuffix() {
    let output = FileManager::generate_output_path(Path::new("/in/lesson 1.mkv"), Path::new("/out"));
    assert_eq!(output, Path::new("/out/lesson 1.practice.mp4"));
    assert!(FileManager::is_practice_output(&output));
    assert!(!FileManager::is_practice_output(Path::new("/in/lesson 1.mkv")));
}

#[test]
fn test_findCaptionFor_shouldPreferPlainThenLanguageTagged() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let video = common::create_test_clip(dir, "talk.mp4")?;

    assert_eq!(FileManager::find_caption_for(&video, Some("en")), None);

    common::create_test_file(dir, "talk.en.vtt", "WEBVTT\n")?;
    assert_eq!(FileManager::find_caption_for(&video, Some("en")), Some(dir.join("talk.en.vtt")));
    assert_eq!(FileManager::find_caption_for(&video, None), None);

    common::create_test_file(dir, "talk.vtt", "WEBVTT\n")?;
    common::create_test_file(dir, "talk.srt", "")?;
    assert_eq!(FileManager::find_caption_for(&video, Some("en")), Some(dir.join("talk.srt")));
    Ok(())
}

#[test]
fn test_findVideos_shouldSkipGeneratedOutputs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    fs::create_dir_all(dir.join("sub"))?;
    common::create_test_clip(dir, "a.mp4")?;
    common::create_test_clip(dir, "a.practice.mp4")?;
    common::create_test_clip(&dir.join("sub"), "b.MKV")?;
    common::create_test_file(dir, "notes.txt", "x")?;

    let videos = FileManager::find_videos(dir)?;
    assert_eq!(videos, vec![dir.join("a.mp4"), dir.join("sub").join("b.MKV")]);
    Ok(())
}

#[test]
fn test_detectFileType_shouldClassifyByExtensionThenContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();

    let srt = common::create_test_subtitle(dir, "a.srt")?;
    let video = common::create_test_clip(dir, "a.webm")?;
    let odd = common::create_test_file(dir, "captions.txt", "1\n00:00:01,000 --> 00:00:02,000\nHi\n")?;
    let other = common::create_test_file(dir, "readme.md", "# hi")?;

    assert_eq!(FileManager::detect_file_type(&srt)?, FileType::Caption);
    assert_eq!(FileManager::detect_file_type(&video)?, FileType::Video);
    assert_eq!(FileManager::detect_file_type(&odd)?, FileType::Caption);
    assert_eq!(FileManager::detect_file_type(&other)?, FileType::Unknown);
    assert!(FileManager::detect_file_type(dir.join("missing.srt")).is_err());
    Ok(())
}

#[test]
fn test_appendToLogFile_shouldAppendTimestampedLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log = temp_dir.path().join("logs").join("run.log");

    FileManager::append_to_log_file(&log, "first")?;
    FileManager::append_to_log_file(&log, "second")?;

    let content = FileManager::read_to_string(&log)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    Ok(())
}
