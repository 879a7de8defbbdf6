//! # Configuration Tests
//!
//! Defaults, partial JSON documents and file loading.

use std::io::Write;

use mcusim_core::common::error::ConfigError;
use mcusim_core::config::*;
use mcusim_core::script::Limits;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.general.frequency_hz, 16_000_000);
    assert!((config.general.initial_temperature - 25.0).abs() < f64::EPSILON);
}

#[test]
fn test_board_config_defaults() {
    let board = BoardConfig::default();
    assert_eq!(board.lcd_width, 16);
    assert_eq!(board.lcd_height, 2);
    assert!(board.lcd_backlight);
    assert!((board.temperature_min + 40.0).abs() < f64::EPSILON);
    assert!((board.temperature_max - 125.0).abs() < f64::EPSILON);
    assert_eq!(board.timer_count, 2);
    assert_eq!(board.timer_period, 1000);
    assert_eq!(board.timer_prescaler, 1);
}

#[test]
fn test_execution_config_defaults() {
    let execution = ExecutionConfig::default();
    assert_eq!(execution.timeout_ms, Some(2000));
    assert_eq!(execution.max_steps, None);
    assert_eq!(execution.max_call_depth, 64);
    assert_eq!(execution.max_catch_up, 1000);
    assert!(!execution.rollback_on_error);
    assert_eq!(execution.timeout(), Some(std::time::Duration::from_millis(2000)));
}

#[test]
fn test_empty_document_is_default() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config.board.lcd_width, 16);
    assert_eq!(config.execution.timeout_ms, Some(2000));
}

#[test]
fn test_partial_section() {
    let config = Config::from_json(r#"{ "execution": { "max_steps": 5000, "timeout_ms": null } }"#).unwrap();
    assert_eq!(config.execution.max_steps, Some(5000));
    assert_eq!(config.execution.timeout_ms, None);
    assert_eq!(config.execution.max_call_depth, 64);
}

#[test]
fn test_limits_follow_execution_config() {
    let config = Config::from_json(
        r#"{ "execution": { "timeout_ms": 150, "max_steps": 10, "max_call_depth": 12, "max_catch_up": 3 } }"#,
    )
    .unwrap();
    let limits = Limits::from(&config.execution);
    assert_eq!(limits.timeout, Some(std::time::Duration::from_millis(150)));
    assert_eq!(limits.max_steps, Some(10));
    assert_eq!(limits.max_call_depth, 12);
    assert_eq!(limits.max_catch_up, 3);
}

#[test]
fn test_invalid_json_is_rejected() {
    let err = Config::from_json(r#"{ "board": { "lcd_width": "wide" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
    assert!(err.to_string().starts_with("invalid config"));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "general": {{ "initial_temperature": 30.5 }}, "board": {{ "lcd_height": 4 }} }}"#).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert!((config.general.initial_temperature - 30.5).abs() < f64::EPSILON);
    assert_eq!(config.board.lcd_height, 4);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_inverted_temperature_range_is_rejected() {
    let err = Config::from_json(r#"{ "board": { "temperature_min": 100.0, "temperature_max": 0.0 } }"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("temperature_min"), "{err}");
}

#[test]
fn test_degenerate_temperature_range_is_accepted() {
    let config = Config::from_json(r#"{ "board": { "temperature_min": 20.0, "temperature_max": 20.0 } }"#).unwrap();
    assert!(config.validate().is_ok());
}
