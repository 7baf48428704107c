/*!
 * Tests for application configuration functionality
 */

use wordweave::app_config::{Config, LogLevel};
use wordweave::processing::markup::{OriginalWordDisplayMode, TranslationPosition};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.replacement_rate, 0.3);
    assert_eq!(config.batch_size, 8);
    assert_eq!(config.display.original_word_display_mode, OriginalWordDisplayMode::Visible);
    assert_eq!(config.display.translation_position, TranslationPosition::After);
    assert!(config.display.show_parentheses);
    assert_eq!(config.pulse_duration_ms, 1500);
    assert_eq!(config.stats_smoothing, 0.2);
    assert!(config.pronunciation_enabled);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test saving and loading configuration through a file
#[test]
fn test_config_saveAndLoad_shouldRoundTripThroughFile() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("wordweave.json");

    let mut config = Config::default();
    config.replacement_rate = 0.45;
    config.display.original_word_display_mode = OriginalWordDisplayMode::Learning;
    config.log_level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

/// Test that a hand-written partial file picks up defaults
#[test]
fn test_config_fromFile_withPartialContent_shouldUseDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "partial.json",
        r#"{ "batch_size": 2, "pronunciation_enabled": false, "log_level": "trace" }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.batch_size, 2);
    assert!(!config.pronunciation_enabled);
    assert_eq!(config.log_level, LogLevel::Trace);
    assert_eq!(config.replacement_rate, 0.3);
}

/// Test error reporting for missing and malformed files
#[test]
fn test_config_fromFile_withBadInput_shouldFailWithContext() {
    let dir = common::create_temp_dir().unwrap();

    let missing = Config::from_file(dir.path().join("nope.json")).unwrap_err();
    assert!(missing.to_string().contains("Failed to read config file"));

    let path = common::create_test_file(dir.path(), "bad.json", "{ \"batch_size\": \"many\" }").unwrap();
    let malformed = Config::from_file(&path).unwrap_err();
    assert!(malformed.to_string().contains("Failed to parse config file"));
}

/// Test validation bounds
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.replacement_rate = f64::NAN;
    assert!(config.validate().is_err());
    config.replacement_rate = 1.0;
    assert!(config.validate().is_ok());

    config.stats_smoothing = 1.0;
    assert!(config.validate().is_ok());
    config.stats_smoothing = 1.01;
    assert!(config.validate().is_err());
}
