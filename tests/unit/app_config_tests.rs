/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;

use yastgen::app_config::{Config, LogLevel};
use yastgen::errors::ConfigError;
use yastgen::subtitle_track::OutputKind;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.outputs, vec![OutputKind::Source]);
    assert_eq!(config.segmentation.max_join_size, 100);
    assert_eq!(config.segmentation.max_delta_time_ms, 1000);
    assert_eq!(config.optimizer.energy_passes, 3);
    assert_eq!(config.optimizer.silence_passes, 3);
    assert_eq!(config.trim.trim_size_ms, 200);
    assert_eq!(config.bilingual.destination_style, "Translated");
    assert!(config.concurrency > 0);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    // Invalid source language
    config.source_language = "qqq".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidLanguage(_))));
    config.source_language = "en".to_string();

    // Inverted region bounds
    config.auditok.min_region_ms = 7000;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidRange { .. })));
    config.auditok.min_region_ms = 500;

    // Edge ratio at or above one half leaves no split window
    config.segmentation.min_edge_ratio = 0.5;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    config.segmentation.min_edge_ratio = 0.1;

    // Bilingual style missing from the style table
    config.bilingual.destination_style = "Nowhere".to_string();
    assert_eq!(config.validate(), Err(ConfigError::UnknownStyle("Nowhere".to_string())));
    config.bilingual.destination_style = "Translated".to_string();

    // No outputs
    config.outputs.clear();
    assert!(config.validate().is_err());
}

/// Test that reversed optimizer bounds are accepted (they are swapped at search time)
#[test]
fn test_optimizer_config_withReversedBounds_shouldStillValidate() {
    let mut config = Config::default();
    config.optimizer.energy_min = 70;
    config.optimizer.energy_max = 30;
    assert!(config.validate().is_ok());

    config.optimizer.energy_passes = 0;
    assert!(config.validate().is_err());
}

/// Test that a missing config file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.source_language, "en");

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.segmentation.max_join_size, config.segmentation.max_join_size);
    Ok(())
}

/// Test that partial config files are completed with defaults
#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "conf.json",
        r#"{
            "source_language": "ja",
            "outputs": ["source", "source-over-destination"],
            "segmentation": { "max_join_size": 42 }
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.source_language, "ja");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.segmentation.max_join_size, 42);
    assert_eq!(config.segmentation.max_delta_time_ms, 1000);
    assert!(config.requested_outputs().contains(&OutputKind::SourceOverDestination));
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test that malformed config files are reported
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(&temp_dir.path().to_path_buf(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}
