/*!
 * Tests for app configuration
 */

use anyhow::Result;
use dualsub::app_config::{Config, LogLevel};
use dualsub::merge::{BackboneMode, Layout, SecondaryStyle, DEFAULT_GUARD_MS};
use crate::common;

#[test]
fn test_default_config_shouldBeValid() {
    let config = Config::default();

    assert_eq!(config.primary_language, "en");
    assert_eq!(config.secondary_language, "fr");
    assert_eq!(config.merge.mode, BackboneMode::MasterAnchored);
    assert_eq!(config.merge.guard_ms, DEFAULT_GUARD_MS);
    assert!(config.merge.clamp_overlaps);
    assert_eq!(config.format.layout, Layout::Stacked);
    assert_eq!(config.format.secondary_style, SecondaryStyle::Italic);
    assert!(!config.translation.enabled);
    assert!(config.cache.enabled);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r##"{
            "primary_language": "es",
            "secondary_language": "de",
            "merge": { "mode": "interval_union", "offset_ms": -1200 },
            "format": { "layout": "side_by_side", "secondary_style": { "color": "#ffff54" } },
            "log_level": "debug"
        }"##,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.primary_language, "es");
    assert_eq!(config.merge.mode, BackboneMode::IntervalUnion);
    assert_eq!(config.merge.offset_ms, -1200);
    assert_eq!(config.merge.guard_ms, DEFAULT_GUARD_MS);
    assert!(config.merge.clamp_overlaps);
    assert_eq!(config.format.layout, Layout::SideBySide);
    assert_eq!(config.format.secondary_style, SecondaryStyle::Color("#ffff54".to_string()));
    assert_eq!(config.format.column_width, 32);
    assert_eq!(config.provider.retry_count, 3);
    assert_eq!(config.translation.batch_size, 20);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_from_file_withBrokenJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_load_or_create_shouldWriteDefaultsOnce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());

    let mut edited = created.clone();
    edited.secondary_language = "it".to_string();
    edited.save(&path)?;

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.secondary_language, "it");
    Ok(())
}

#[test]
fn test_validate_shouldRejectBadValues() {
    let mut same_language = Config::default();
    same_language.secondary_language = "eng".to_string();
    assert!(same_language.validate().is_err());

    let mut unknown_language = Config::default();
    unknown_language.primary_language = "xx".to_string();
    assert!(unknown_language.validate().is_err());

    let mut narrow = Config::default();
    narrow.format.max_line_width = 5;
    assert!(narrow.validate().is_err());

    let mut narrow_columns = Config::default();
    narrow_columns.format.layout = Layout::SideBySide;
    narrow_columns.format.column_width = 4;
    assert!(narrow_columns.validate().is_err());

    let mut wide_guard = Config::default();
    wide_guard.merge.guard_ms = 5_000;
    assert!(wide_guard.validate().is_err());

    let mut no_pairs = Config::default();
    no_pairs.merge.top_n = 0;
    assert!(no_pairs.validate().is_err());

    let mut empty_batches = Config::default();
    empty_batches.translation.batch_size = 0;
    assert!(empty_batches.validate().is_err());

    let mut no_endpoint = Config::default();
    no_endpoint.translation.enabled = true;
    no_endpoint.translation.endpoint = "  ".to_string();
    assert!(no_endpoint.validate().is_err());
}

#[test]
fn test_merge_engine_shouldFollowConfig() {
    let mut config = Config::default();
    config.merge.guard_ms = 0;
    config.merge.mode = BackboneMode::IntervalUnion;

    let engine = config.merge_engine();

    assert_eq!(engine.aligner().guard_ms, 0);
    assert_eq!(engine.aligner().mode, BackboneMode::IntervalUnion);
}

#[test]
fn test_log_level_shouldMapToFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
