/*!
 * Tests for language code utilities
 */

use shadowreel::language_utils::{
    get_language_name, language_codes_match, normalize_to_part2t, split_language_pair, validate_language_code,
};

#[test]
fn test_normalizeToPart2t_withCommonCodes_shouldReturnThreeLetters() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("KO").unwrap(), "kor");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert!(normalize_to_part2t("english").is_err());
}

#[test]
fn test_languageCodesMatch_shouldIgnoreForm() {
    assert!(language_codes_match("ja", "jpn"));
    assert!(!language_codes_match("ja", "ko"));
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("ko").unwrap(), "Korean");
    assert!(validate_language_code("qq").is_err());
}

#[test]
fn test_splitLanguagePair_shouldAcceptUnderscoreAndPlus() {
    assert_eq!(split_language_pair("en_ko"), Some(("en".to_string(), "ko".to_string())));
    assert_eq!(split_language_pair("EN+ja"), Some(("en".to_string(), "ja".to_string())));
    assert_eq!(split_language_pair("source_target"), None);
    assert_eq!(split_language_pair("en"), None);
}
