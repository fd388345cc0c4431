/*!
 * Tests for pass planning, caption transformation and translation lookup
 */

use anyhow::Result;

use shadowreel::errors::ErrorKind;
use shadowreel::pipeline::concat::build_concat_manifest;
use shadowreel::practice::planner::{self, focus_message};
use shadowreel::practice::{transform_cues, SubtitleMode, TranslationLookup};
use shadowreel::subtitle_processor::Cue;
use crate::common;

const ALL_MODES: [SubtitleMode; 4] = [
    SubtitleMode::None,
    SubtitleMode::Source,
    SubtitleMode::Target,
    SubtitleMode::SourceAndTarget,
];

fn cues() -> Vec<Cue> {
    vec![
        Cue::new(1, 0, 1_500, "Good morning"),
        Cue::new(2, 1_500, 3_000, "How are you?"),
        Cue::new(3, 2_800, 4_000, "Untranslated line").with_translation("잘 지내요"),
        Cue::new(4, 4_000, 5_000, "No translation anywhere"),
    ]
}

fn lookup() -> TranslationLookup {
    TranslationLookup::from_pairs([("Good morning", "좋은 아침"), ("How are you?", "어떻게 지내세요?")])
}

#[test]
fn test_plan_withTwoModesAndFivePasses_shouldPadWithLast() -> Result<()> {
    let plan = planner::plan(
        &cues(),
        5,
        &[SubtitleMode::None, SubtitleMode::Target],
        false,
    )?;

    assert_eq!(plan.len(), 5);
    assert_eq!(plan.passes[0].mode, SubtitleMode::None);
    for pass in &plan.passes[1..] {
        assert_eq!(pass.mode, SubtitleMode::Target);
    }
    assert_eq!(plan.unit_count(), 9);
    Ok(())
}

#[test]
fn test_plan_withEmptyModes_shouldUseSourceAndTarget() -> Result<()> {
    let plan = planner::plan(&cues(), 2, &[], false)?;
    assert!(plan.passes.iter().all(|p| p.mode == SubtitleMode::SourceAndTarget));
    Ok(())
}

#[test]
fn test_plan_withTts_shouldFlagOnlyFirstPass() -> Result<()> {
    for repeat in 1..6 {
        let plan = planner::plan(&cues(), repeat, &[SubtitleMode::Source], true)?;
        let flagged: Vec<usize> = plan
            .passes
            .iter()
            .filter(|p| p.synthesize_audio)
            .map(|p| p.pass_index)
            .collect();
        assert_eq!(flagged, vec![0]);
    }

    let silent = planner::plan(&cues(), 3, &[SubtitleMode::Source], false)?;
    assert!(silent.audio_pass().is_none());
    Ok(())
}

#[test]
fn test_plan_withZeroRepeat_shouldFail() {
    let err = planner::plan(&cues(), 0, &[SubtitleMode::Source], false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
}

#[test]
fn test_plan_withNoCues_shouldOnlyAllowCaptionlessPlans() {
    assert!(planner::plan(&[], 2, &[SubtitleMode::None], false).is_ok());
    assert!(planner::plan(&[], 2, &[SubtitleMode::None, SubtitleMode::Source], false).is_err());
    assert!(planner::plan(&[], 2, &[SubtitleMode::None], true).is_err());
}

#[test]
fn test_interludes_shouldSitBetweenPassesOnly() -> Result<()> {
    let plan = planner::plan(&cues(), 4, &[SubtitleMode::Source], false)?;
    let messages = vec!["One".to_string(), "Two".to_string(), "Three".to_string()];
    let interludes = plan.interludes(&messages);

    assert_eq!(interludes.len(), 3);
    assert_eq!(
        interludes.iter().map(|i| i.after_pass).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(focus_message(&messages, 4), "Two");
    assert_eq!(focus_message(&[], 1), "Do you remember?");
    Ok(())
}

#[test]
fn test_transform_withNone_shouldAlwaysBeEmpty() {
    assert!(transform_cues(&cues(), SubtitleMode::None, Some(&lookup())).is_empty());
    assert!(transform_cues(&cues(), SubtitleMode::None, None).is_empty());
}

#[test]
fn test_transform_withTarget_shouldFallBackToSource() {
    let out = transform_cues(&cues(), SubtitleMode::Target, Some(&lookup()));
    let texts: Vec<&str> = out.iter().map(|c| c.source_text.as_str()).collect();

    assert_eq!(
        texts,
        vec!["좋은 아침", "어떻게 지내세요?", "잘 지내요", "No translation anywhere"]
    );
    assert!(out.iter().all(|c| !c.source_text.is_empty()));
}

#[test]
fn test_transform_withSourceAndTarget_shouldStackLines() {
    let out = transform_cues(&cues(), SubtitleMode::SourceAndTarget, Some(&lookup()));

    assert_eq!(out[0].source_text, "Good morning\n좋은 아침");
    assert_eq!(out[2].source_text, "Untranslated line\n잘 지내요");
    assert_eq!(out[3].source_text, "No translation anywhere");
}

#[test]
fn test_transform_shouldBeIdempotentForEveryMode() {
    let lookup = lookup();
    for mode in ALL_MODES {
        for with_lookup in [Some(&lookup), None] {
            let once = transform_cues(&cues(), mode, with_lookup);
            let twice = transform_cues(&once, mode, with_lookup);
            assert_eq!(once, twice, "mode {:?}", mode);
        }
    }
}

#[test]
fn test_transform_shouldPreserveTimingAndInput() {
    let input = cues();
    let snapshot = input.clone();
    for mode in ALL_MODES {
        let out = transform_cues(&input, mode, Some(&lookup()));
        for (before, after) in input.iter().zip(out.iter()) {
            assert_eq!((before.start_ms, before.end_ms), (after.start_ms, after.end_ms));
        }
    }
    assert_eq!(input, snapshot);
}

#[test]
fn test_lookup_fromJsonFile_shouldTrimKeys() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(
        temp_dir.path(),
        "ko.json",
        r#"{"  Good morning ": "좋은 아침", "Blank": "  "}"#,
    )?;

    let lookup = TranslationLookup::from_json_file(&file)?;
    assert_eq!(lookup.get("Good morning"), Some("좋은 아침"));
    assert_eq!(lookup.get("Good morning  "), Some("좋은 아침"));
    assert_eq!(lookup.get("Blank"), None);
    assert_eq!(lookup.len(), 1);
    Ok(())
}

#[test]
fn test_lookup_fromJsonFile_withBadInput_shouldClassify() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let bad = common::create_test_file(temp_dir.path(), "bad.json", "[1, 2, 3]")?;

    let missing = TranslationLookup::from_json_file(temp_dir.path().join("nope.json")).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::MissingResourceError);
    let invalid = TranslationLookup::from_json_file(&bad).unwrap_err();
    assert_eq!(invalid.kind(), ErrorKind::ConfigurationError);
    Ok(())
}

#[test]
fn test_parseToken_shouldResolveLanguageCodes() -> Result<()> {
    assert_eq!(SubtitleMode::parse_token("en", "en", "ko")?, SubtitleMode::Source);
    assert_eq!(SubtitleMode::parse_token("ko", "en", "ko")?, SubtitleMode::Target);
    assert_eq!(SubtitleMode::parse_token("en_ko", "en", "ko")?, SubtitleMode::SourceAndTarget);
    assert_eq!(SubtitleMode::parse_token("no_subtitle", "en", "ko")?, SubtitleMode::None);
    assert!(SubtitleMode::parse_token("fr", "en", "ko").is_err());
    assert!(SubtitleMode::parse_token("karaoke", "en", "ko").is_err());
    Ok(())
}

#[test]
fn test_concatManifest_shouldFollowUnitOrder() {
    let units: Vec<std::path::PathBuf> = ["/w/P0.mp4", "/w/I0.mp4", "/w/P1.mp4", "/w/I1.mp4", "/w/P2.mp4"]
        .iter()
        .map(std::path::PathBuf::from)
        .collect();
    let manifest = build_concat_manifest(&units);
    let order: Vec<&str> = manifest
        .lines()
        .map(|l| l.trim_start_matches("file '/w/").trim_end_matches(".mp4'"))
        .collect();
    assert_eq!(order, vec!["P0", "I0", "P1", "I1", "P2"]);
}
