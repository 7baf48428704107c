/*!
 * Tests for the translator implementations
 */

use std::time::Instant;

use wordweave::errors::TranslatorError;
use wordweave::providers::Translator;
use wordweave::providers::dictionary::DictionaryTranslator;
use wordweave::providers::mock::MockTranslator;

use crate::common;

#[tokio::test]
async fn test_dictionary_fromFile_shouldTranslateKnownWords() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "fr.json",
        r#"{ "Morning": "matin", "coffee": "café", "good": "bon" }"#,
    )
    .unwrap();

    let dictionary = DictionaryTranslator::from_file(&path).unwrap();
    assert_eq!(dictionary.len(), 3);

    let response = dictionary.translate("Good morning, coffee?", Some(2)).await.unwrap();

    let pairs: Vec<(&str, &str, usize)> = response
        .replacements
        .iter()
        .map(|r| (r.original.as_str(), r.translation.as_str(), r.position.start))
        .collect();
    assert_eq!(pairs, vec![("Good", "bon", 0), ("morning", "matin", 5)]);
}

#[tokio::test]
async fn test_dictionary_withAccentedText_shouldReportCharOffsets() {
    let dictionary = DictionaryTranslator::new([("thé", "tea")]);

    let response = dictionary.translate("déjà du thé", None).await.unwrap();

    assert_eq!(response.replacements.len(), 1);
    assert_eq!(response.replacements[0].position.start, 8);
    assert_eq!(response.replacements[0].position.end, 11);
}

#[test]
fn test_dictionary_fromFile_withMissingFile_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    assert!(DictionaryTranslator::from_file(dir.path().join("none.json")).is_err());
}

#[tokio::test]
async fn test_mock_failing_shouldReturnApiError() {
    let mock = MockTranslator::failing();
    let error = mock.translate("anything", None).await.unwrap_err();
    assert!(matches!(error, TranslatorError::ApiError { status_code: 500, .. }));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_mock_drifting_shouldShiftPositions() {
    let mock = MockTranslator::drifting();
    let response = mock.translate("red fox", Some(2)).await.unwrap();
    assert_eq!(response.replacements[0].position.start, 1);
    assert_eq!(response.replacements[1].position.start, 5);
    assert_eq!(mock.seen_texts(), vec!["red fox".to_string()]);
}

#[tokio::test]
async fn test_mock_slow_shouldDelayResponse() {
    let mock = MockTranslator::slow(30);
    let started = Instant::now();
    let response = mock.translate("slow words", Some(1)).await.unwrap();
    assert!(started.elapsed().as_millis() >= 30);
    assert_eq!(response.replacements.len(), 1);
    assert_eq!(mock.last_target(), Some(1));
}

#[test]
fn test_dictionary_translate_withoutLimit_shouldReturnEveryKnownWord() {
    let dictionary = DictionaryTranslator::from_json(r#"{ "sun": "soleil", "sea": "mer" }"#).unwrap();

    let response = tokio_test::block_on(dictionary.translate("sun, sea and sun again", None)).unwrap();

    assert_eq!(response.replacements.len(), 2);
    assert_eq!(response.replacements[1].position.start, 5);
}
