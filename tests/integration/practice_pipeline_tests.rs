/*!
 * End-to-end tests for practice video generation over the mock transcoder
 */

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;

use shadowreel::errors::ErrorKind;
use shadowreel::media::{MockOperation, MockTranscoder};
use shadowreel::pipeline::{GenerationRequest, GenerationResult, PipelineProgress, PipelineState, UnitKind};
use shadowreel::practice::TranslationLookup;
use shadowreel::subtitle_processor::ClipRange;
use crate::common;

/// Two passes over a one-cue clip: pass, interlude, pass
#[tokio::test]
async fn test_generate_withTwoPassesNoTts_shouldConcatenateThreeUnits() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;
    let output = temp_dir.path().join("out").join("practice.mp4");

    let mock = Arc::new(MockTranscoder::working());
    let pipeline = common::mock_pipeline(common::test_config(&temp_dir.path().join("work")), &mock, None);

    let run = pipeline
        .run_detailed(GenerationRequest::new(&clip, &captions, &output), None)
        .await;

    let kinds: Vec<UnitKind> = run.units.iter().map(|u| u.kind).collect();
    assert_eq!(kinds, vec![UnitKind::Pass, UnitKind::Interlude, UnitKind::Pass]);

    let unit_sum: f64 = run.units.iter().map(|u| u.duration_seconds).sum();
    match &run.result {
        GenerationResult::Success {
            output_path,
            pass_count,
            total_duration_seconds,
        } => {
            assert_eq!(output_path, &output);
            assert_eq!(*pass_count, 2);
            assert!((total_duration_seconds - unit_sum).abs() < 1e-9);
            assert!((total_duration_seconds - 6.0).abs() < 1e-9);
        }
        other => panic!("expected success, got {:?}", other),
    }

    assert!(output.exists());
    let concat = mock.calls_of(MockOperation::Concatenate);
    assert_eq!(concat.len(), 1);
    assert_eq!(concat[0].detail.lines().count(), 3);

    // Pass 0 is stream-copied, pass 1 gets "Hello" burned in
    assert_eq!(mock.calls_of(MockOperation::StreamCopy).len(), 1);
    let burns = mock.calls_of(MockOperation::BurnCaptions);
    assert_eq!(burns.len(), 1);
    assert!(burns[0].detail.contains("Hello"));
    Ok(())
}

#[tokio::test]
async fn test_generate_withSourceAndTargetButNoTranslation_shouldBurnSingleLine() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;
    let output = temp_dir.path().join("practice.mp4");

    let mut config = common::test_config(&temp_dir.path().join("work"));
    config.repeat.subtitle_modes = vec!["no_subtitle".to_string(), "source_target".to_string()];
    let mock = Arc::new(MockTranscoder::working());
    let pipeline = common::mock_pipeline(config, &mock, None);

    let lookup = TranslationLookup::from_pairs([("Goodbye", "안녕히 가세요")]);
    let result = pipeline
        .run(GenerationRequest::new(&clip, &captions, &output).with_translation(lookup), None)
        .await;
    assert!(result.is_success(), "{}", result.summary());

    let burns = mock.calls_of(MockOperation::BurnCaptions);
    assert_eq!(burns.len(), 1);
    let srt = &burns[0].detail;
    let text_lines: Vec<&str> = srt
        .lines()
        .skip(2)
        .take_while(|line| !line.trim().is_empty())
        .collect();
    assert_eq!(text_lines, vec!["Hello"]);
    Ok(())
}

#[tokio::test]
async fn test_generate_withTranslation_shouldBurnBothLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;
    let output = temp_dir.path().join("practice.mp4");

    let mut config = common::test_config(&temp_dir.path().join("work"));
    config.repeat.repeat_count = 3;
    config.repeat.subtitle_modes = vec!["ko".to_string(), "en_ko".to_string()];
    let mock = Arc::new(MockTranscoder::working());
    let pipeline = common::mock_pipeline(config, &mock, None);

    let lookup = TranslationLookup::from_pairs([("Hello", "안녕하세요")]);
    let result = pipeline
        .run(GenerationRequest::new(&clip, &captions, &output).with_translation(lookup), None)
        .await;
    assert!(result.is_success(), "{}", result.summary());

    let burns = mock.calls_of(MockOperation::BurnCaptions);
    assert_eq!(burns.len(), 3);
    assert!(burns[0].detail.contains("안녕하세요"));
    assert!(!burns[0].detail.contains("Hello"));
    for burn in &burns[1..] {
        assert!(burn.detail.contains("Hello\n안녕하세요"));
    }

    let messages: Vec<String> = mock
        .calls_of(MockOperation::RenderInterlude)
        .into_iter()
        .map(|c| c.detail)
        .collect();
    assert_eq!(messages, vec!["Focus again!", "Do you remember?"]);
    Ok(())
}

#[tokio::test]
async fn test_generate_withMissingClip_shouldFailRenderingAndCleanUp() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;
    let work_dir = temp_dir.path().join("work");
    let output = temp_dir.path().join("practice.mp4");

    let mock = Arc::new(MockTranscoder::working());
    let pipeline = common::mock_pipeline(common::test_config(&work_dir), &mock, None);

    let run = pipeline
        .run_detailed(
            GenerationRequest::new(temp_dir.path().join("missing.mp4"), &captions, &output),
            None,
        )
        .await;

    match &run.result {
        GenerationResult::Failure { stage, error_kind, .. } => {
            assert_eq!(*stage, PipelineState::RenderingPasses);
            assert_eq!(*error_kind, ErrorKind::MissingResourceError);
        }
        other => panic!("expected failure, got {:?}", other),
    }

    assert!(!run.work_dir.exists());
    for path in &run.temp_resources {
        assert!(!path.exists(), "{} should be gone", path.display());
    }
    assert!(common::remaining_files(&work_dir).is_empty());
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_generate_withMissingCaptions_shouldFailPlanning() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;

    let mock = Arc::new(MockTranscoder::working());
    let pipeline = common::mock_pipeline(common::test_config(&temp_dir.path().join("work")), &mock, None);

    let result = pipeline
        .run(
            GenerationRequest::new(&clip, temp_dir.path().join("none.srt"), temp_dir.path().join("o.mp4")),
            None,
        )
        .await;

    match result {
        GenerationResult::Failure { stage, error_kind, .. } => {
            assert_eq!(stage, PipelineState::Planning);
            assert_eq!(error_kind, ErrorKind::MissingResourceError);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(mock.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_generate_withConcatFailure_shouldFailConcatenating() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;
    let work_dir = temp_dir.path().join("work");

    let mock = Arc::new(
        MockTranscoder::working().failing_on(MockOperation::Concatenate, "Unsafe file name 'x'"),
    );
    let pipeline = common::mock_pipeline(common::test_config(&work_dir), &mock, None);

    let run = pipeline
        .run_detailed(GenerationRequest::new(&clip, &captions, temp_dir.path().join("o.mp4")), None)
        .await;

    match &run.result {
        GenerationResult::Failure {
            stage,
            error_kind,
            message,
        } => {
            assert_eq!(*stage, PipelineState::Concatenating);
            assert_eq!(*error_kind, ErrorKind::ExternalToolError);
            assert!(message.contains("Unsafe file name 'x'"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(common::remaining_files(&work_dir).is_empty());
    assert!(!temp_dir.path().join("o.mp4").exists());
    Ok(())
}

#[tokio::test]
async fn test_generate_withEmptyConcatOutput_shouldLeaveNoOutputFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;
    let out_dir = temp_dir.path().join("out");
    let output = out_dir.join("o.mp4");

    let mock = Arc::new(MockTranscoder::working().with_empty_output(MockOperation::Concatenate));
    let pipeline = common::mock_pipeline(common::test_config(&temp_dir.path().join("work")), &mock, None);

    let result = pipeline
        .run(GenerationRequest::new(&clip, &captions, &output), None)
        .await;

    match result {
        GenerationResult::Failure { stage, error_kind, .. } => {
            assert_eq!(stage, PipelineState::Concatenating);
            assert_eq!(error_kind, ErrorKind::EmptyOutputError);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!output.exists());
    assert!(common::remaining_files(&out_dir).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_generate_withConcatFailure_shouldKeepPreviousOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;
    let output = common::create_test_file(temp_dir.path(), "o.mp4", "previous run")?;

    let mock = Arc::new(MockTranscoder::working().with_empty_output(MockOperation::Concatenate));
    let pipeline = common::mock_pipeline(common::test_config(&temp_dir.path().join("work")), &mock, None);

    let result = pipeline
        .run(GenerationRequest::new(&clip, &captions, &output), None)
        .await;

    assert!(!result.is_success());
    assert_eq!(std::fs::read_to_string(&output)?, "previous run");
    assert!(!temp_dir.path().join("o.partial.mp4").exists());
    Ok(())
}

#[tokio::test]
async fn test_generate_withEmptyRenderOutput_shouldReportEmptyOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;

    let mock = Arc::new(MockTranscoder::working().with_empty_output(MockOperation::BurnCaptions));
    let pipeline = common::mock_pipeline(common::test_config(&temp_dir.path().join("work")), &mock, None);

    let result = pipeline
        .run(GenerationRequest::new(&clip, &captions, temp_dir.path().join("o.mp4")), None)
        .await;

    match result {
        GenerationResult::Failure { stage, error_kind, .. } => {
            assert_eq!(stage, PipelineState::RenderingPasses);
            assert_eq!(error_kind, ErrorKind::EmptyOutputError);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_generate_withZeroRepeat_shouldFailWithConfigurationError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;

    let mut config = common::test_config(&temp_dir.path().join("work"));
    config.repeat.repeat_count = 0;
    let mock = Arc::new(MockTranscoder::working());
    let pipeline = common::mock_pipeline(config, &mock, None);

    let result = pipeline
        .run(GenerationRequest::new(&clip, &captions, temp_dir.path().join("o.mp4")), None)
        .await;

    match result {
        GenerationResult::Failure { stage, error_kind, .. } => {
            assert_eq!(stage, PipelineState::Planning);
            assert_eq!(error_kind, ErrorKind::ConfigurationError);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_generate_shouldReportMonotonicProgressEndingAtDone() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "clip.mp4")?;
    let captions = common::create_hello_subtitle(temp_dir.path())?;

    let mut config = common::test_config(&temp_dir.path().join("work"));
    config.repeat.repeat_count = 4;
    let mock = Arc::new(MockTranscoder::working());
    let pipeline = common::mock_pipeline(config, &mock, None);

    let seen: Mutex<Vec<PipelineProgress>> = Mutex::new(Vec::new());
    let sink = |progress: PipelineProgress| seen.lock().push(progress);
    let result = pipeline
        .run(GenerationRequest::new(&clip, &captions, temp_dir.path().join("o.mp4")), Some(&sink))
        .await;
    assert!(result.is_success());

    let seen = seen.into_inner();
    assert!(seen.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(seen.first().map(|p| p.state), Some(PipelineState::Planning));
    assert!(seen.iter().any(|p| p.state == PipelineState::RenderingPasses));
    assert!(seen.iter().any(|p| p.state == PipelineState::Concatenating));
    assert!(!seen.iter().any(|p| p.state == PipelineState::SynthesizingAudio));
    let last = seen.last().cloned().unwrap();
    assert_eq!(last.state, PipelineState::Done);
    assert_eq!(last.percent, 100);
    Ok(())
}

#[tokio::test]
async fn test_generate_withClipRange_shouldExtractAndRebaseCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let clip = common::create_test_clip(temp_dir.path(), "movie.mkv")?;
    let captions = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let mut config = common::test_config(&temp_dir.path().join("work"));
    config.repeat.subtitle_modes = vec!["en".to_string()];
    let mock = Arc::new(MockTranscoder::new(30.0));
    let pipeline = common::mock_pipeline(config, &mock, None);

    let request = GenerationRequest::new(&clip, &captions, temp_dir.path().join("o.mp4"))
        .with_clip_range(ClipRange::new(5_000, 10_000)?);
    let run = pipeline.run_detailed(request, None).await;
    assert!(run.result.is_success(), "{}", run.result.summary());

    let extracts = mock.calls_of(MockOperation::ExtractRange);
    assert_eq!(extracts.len(), 1);
    assert_eq!(extracts[0].detail, "5000-10000");

    // Every pass renders from the extracted clip, not the movie
    for burn in mock.calls_of(MockOperation::BurnCaptions) {
        assert_ne!(burn.inputs[0], clip);
        assert!(burn.detail.contains("00:00:00,000 --> 00:00:04,000"));
        assert!(burn.detail.contains("It contains multiple entries."));
        assert!(!burn.detail.contains("For testing purposes."));
    }
    assert!(run.units.iter().all(|u| u.kind == UnitKind::Interlude || u.duration_seconds == 5.0));
    Ok(())
}
