//! Configuration system for the microcontroller simulator.
//!
//! This module defines the configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline board constants (clock, LCD geometry, sensor range, timers).
//! 2. **Structures:** Hierarchical config for general, board, and execution settings.
//! 3. **Loading:** JSON decoding from a string or a file.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is valid.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Core clock frequency in Hz (16 MHz).
    pub const FREQUENCY_HZ: u32 = 16_000_000;

    /// Ambient temperature reported by the sensor after a reset, in °C.
    pub const INITIAL_TEMPERATURE: f64 = 25.0;

    /// LCD columns.
    pub const LCD_WIDTH: usize = 16;

    /// LCD rows.
    pub const LCD_HEIGHT: usize = 2;

    /// Lowest temperature the sensor can report, in °C.
    pub const TEMPERATURE_MIN: f64 = -40.0;

    /// Highest temperature the sensor can report, in °C.
    pub const TEMPERATURE_MAX: f64 = 125.0;

    /// Number of hardware timers.
    pub const TIMER_COUNT: usize = 2;

    /// Timer period after reset.
    pub const TIMER_PERIOD: u32 = 1000;

    /// Timer prescaler after reset.
    pub const TIMER_PRESCALER: u32 = 1;

    /// Wall-clock budget per script invocation, in milliseconds.
    pub const TIMEOUT_MS: u64 = 2000;

    /// Maximum nested script calls.
    pub const MAX_CALL_DEPTH: usize = 64;

    /// Maximum times one periodic callback may fire during a single host tick.
    pub const MAX_CATCH_UP: u32 = 1000;
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use mcusim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.general.frequency_hz, 16_000_000);
/// assert_eq!(config.board.lcd_width, 16);
/// ```
///
/// Deserializing a partial document:
///
/// ```
/// use mcusim_core::config::Config;
///
/// let config = Config::from_json(r#"{ "board": { "lcd_height": 4 }, "execution": { "rollback_on_error": true } }"#).unwrap();
/// assert_eq!(config.board.lcd_height, 4);
/// assert_eq!(config.board.lcd_width, 16);
/// assert!(config.execution.rollback_on_error);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Chip-level settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Peripheral geometry and ranges
    #[serde(default)]
    pub board: BoardConfig,
    /// Script execution budget and failure policy
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Config {
    /// Decodes a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let board = &self.board;
        if !board.temperature_min.is_finite() || !board.temperature_max.is_finite() {
            return Err(ConfigError::Invalid(
                "board.temperature_min and board.temperature_max must be finite".to_string(),
            ));
        }
        if board.temperature_min > board.temperature_max {
            return Err(ConfigError::Invalid(format!(
                "board.temperature_min ({}) is above board.temperature_max ({})",
                board.temperature_min, board.temperature_max
            )));
        }
        Ok(())
    }

    /// Reads and decodes a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// Chip-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Reported core clock frequency in Hz
    #[serde(default = "GeneralConfig::default_frequency_hz")]
    pub frequency_hz: u32,

    /// Sensor temperature after construction and reset, in °C
    #[serde(default = "GeneralConfig::default_initial_temperature")]
    pub initial_temperature: f64,
}

impl GeneralConfig {
    fn default_frequency_hz() -> u32 {
        defaults::FREQUENCY_HZ
    }

    fn default_initial_temperature() -> f64 {
        defaults::INITIAL_TEMPERATURE
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            frequency_hz: defaults::FREQUENCY_HZ,
            initial_temperature: defaults::INITIAL_TEMPERATURE,
        }
    }
}

/// Peripheral geometry and ranges.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// LCD columns
    #[serde(default = "BoardConfig::default_lcd_width")]
    pub lcd_width: usize,

    /// LCD rows
    #[serde(default = "BoardConfig::default_lcd_height")]
    pub lcd_height: usize,

    /// Whether the LCD backlight is on after reset
    #[serde(default = "BoardConfig::default_lcd_backlight")]
    pub lcd_backlight: bool,

    /// Lower clamp for simulated temperature drift, in °C
    #[serde(default = "BoardConfig::default_temperature_min")]
    pub temperature_min: f64,

    /// Upper clamp for simulated temperature drift, in °C
    #[serde(default = "BoardConfig::default_temperature_max")]
    pub temperature_max: f64,

    /// Number of timer entities in the model
    #[serde(default = "BoardConfig::default_timer_count")]
    pub timer_count: usize,

    /// Timer period after reset
    #[serde(default = "BoardConfig::default_timer_period")]
    pub timer_period: u32,

    /// Timer prescaler after reset
    #[serde(default = "BoardConfig::default_timer_prescaler")]
    pub timer_prescaler: u32,
}

impl BoardConfig {
    fn default_lcd_width() -> usize {
        defaults::LCD_WIDTH
    }

    fn default_lcd_height() -> usize {
        defaults::LCD_HEIGHT
    }

    fn default_lcd_backlight() -> bool {
        true
    }

    fn default_temperature_min() -> f64 {
        defaults::TEMPERATURE_MIN
    }

    fn default_temperature_max() -> f64 {
        defaults::TEMPERATURE_MAX
    }

    fn default_timer_count() -> usize {
        defaults::TIMER_COUNT
    }

    fn default_timer_period() -> u32 {
        defaults::TIMER_PERIOD
    }

    fn default_timer_prescaler() -> u32 {
        defaults::TIMER_PRESCALER
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            lcd_width: defaults::LCD_WIDTH,
            lcd_height: defaults::LCD_HEIGHT,
            lcd_backlight: true,
            temperature_min: defaults::TEMPERATURE_MIN,
            temperature_max: defaults::TEMPERATURE_MAX,
            timer_count: defaults::TIMER_COUNT,
            timer_period: defaults::TIMER_PERIOD,
            timer_prescaler: defaults::TIMER_PRESCALER,
        }
    }
}

/// Script execution budget and failure policy.
///
/// `timeout_ms` and `max_steps` may both be set; whichever is exhausted first
/// aborts the invocation with an execution-timeout error. Hosts without a
/// monotonic clock (wasm32) should leave `timeout_ms` unset and rely on
/// `max_steps`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Wall-clock budget per invocation in milliseconds (`None` disables it)
    #[serde(default = "ExecutionConfig::default_timeout_ms")]
    pub timeout_ms: Option<u64>,

    /// Evaluation step budget per invocation (`None` disables it)
    #[serde(default)]
    pub max_steps: Option<u64>,

    /// Maximum nested script calls
    #[serde(default = "ExecutionConfig::default_max_call_depth")]
    pub max_call_depth: usize,

    /// Maximum firings of one periodic callback per host tick
    #[serde(default = "ExecutionConfig::default_max_catch_up")]
    pub max_catch_up: u32,

    /// Restore the pre-execution state when a script fails
    #[serde(default)]
    pub rollback_on_error: bool,
}

impl ExecutionConfig {
    #[allow(clippy::unnecessary_wraps)]
    fn default_timeout_ms() -> Option<u64> {
        Some(defaults::TIMEOUT_MS)
    }

    fn default_max_call_depth() -> usize {
        defaults::MAX_CALL_DEPTH
    }

    fn default_max_catch_up() -> u32 {
        defaults::MAX_CATCH_UP
    }

    /// Returns the wall-clock budget as a [`Duration`], if one is set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(defaults::TIMEOUT_MS),
            max_steps: None,
            max_call_depth: defaults::MAX_CALL_DEPTH,
            max_catch_up: defaults::MAX_CATCH_UP,
            rollback_on_error: false,
        }
    }
}
