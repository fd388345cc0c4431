/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;

use shadowreel::app_config::{Config, TtsConfig, TtsFailurePolicy, TtsProvider, TtsTextSource};
use shadowreel::errors::ErrorKind;
use shadowreel::practice::SubtitleMode;
use crate::common;

/// Test that a config file round-trips through JSON
#[test]
fn test_config_saveAndLoad_shouldPreserveValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = Config::default();
    config.source_language = "ja".to_string();
    config.repeat.repeat_count = 4;
    config.interlude.messages = vec!["Again!".to_string()];
    config.tts = Some(TtsConfig::new(TtsProvider::EdgeTts));

    let path = temp_dir.path().join("conf.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config)?)?;
    let loaded: Config = serde_json::from_str(&std::fs::read_to_string(&path)?)?;

    assert_eq!(loaded.source_language, "ja");
    assert_eq!(loaded.repeat.repeat_count, 4);
    assert_eq!(loaded.interlude.messages, vec!["Again!"]);
    assert_eq!(loaded.tts.map(|t| t.provider), Some(TtsProvider::EdgeTts));
    Ok(())
}

#[test]
fn test_config_withTtsSection_shouldParsePolicies() -> Result<()> {
    let config: Config = serde_json::from_str(
        r#"{
            "tts": {
                "provider": "openai",
                "api_key": "sk-test",
                "text_source": "pass_mode",
                "on_failure": "keep_original_audio"
            }
        }"#,
    )?;

    let tts = config.tts.as_ref().expect("tts section");
    assert_eq!(tts.provider, TtsProvider::OpenAI);
    assert_eq!(tts.text_source, TtsTextSource::PassMode);
    assert_eq!(tts.on_failure, TtsFailurePolicy::KeepOriginalAudio);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_config_withoutTts_shouldDefaultToNone() -> Result<()> {
    let config: Config = serde_json::from_str("{}")?;
    assert!(config.tts.is_none());
    assert_eq!(config.media.timeout_secs, 600);
    Ok(())
}

#[test]
fn test_validate_withBadValues_shouldReportConfigurationError() {
    let cases: Vec<Box<dyn Fn(&mut Config)>> = vec![
        Box::new(|c: &mut Config| c.source_language = "zz".to_string()),
        Box::new(|c: &mut Config| c.repeat.repeat_count = 0),
        Box::new(|c: &mut Config| c.repeat.subtitle_modes = vec!["shadow".to_string()]),
        Box::new(|c: &mut Config| c.subtitle_style.background_color = "grey".to_string()),
        Box::new(|c: &mut Config| c.interlude.duration_secs = 0.0),
        Box::new(|c: &mut Config| {
            let mut tts = TtsConfig::new(TtsProvider::EdgeTts);
            tts.speed = 0.0;
            c.tts = Some(tts);
        }),
    ];

    for mutate in cases {
        let mut config = Config::default();
        mutate(&mut config);
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError, "{}", err);
    }
}

#[test]
fn test_resolveModes_withCustomLanguages_shouldFollowThem() -> Result<()> {
    let mut config = Config::default();
    config.source_language = "ja".to_string();
    config.target_language = "en".to_string();
    config.repeat.subtitle_modes = vec!["ja".to_string(), "en".to_string(), "ja+en".to_string()];

    assert_eq!(
        config.resolve_modes()?,
        vec![SubtitleMode::Source, SubtitleMode::Target, SubtitleMode::SourceAndTarget]
    );
    Ok(())
}
