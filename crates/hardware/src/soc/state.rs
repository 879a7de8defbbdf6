//! Aggregate peripheral state.
//!
//! [`McuState`] is the single owner of every peripheral model. It is built
//! fresh from a [`Config`] on simulator construction and on every reset, and
//! serializes to the camelCase snapshot shape consumed by host UIs.

use serde::Serialize;

use crate::config::Config;
use crate::soc::devices::{GpioBank, Lcd, Motor, RegisterFile, SerialLog, TemperatureSensor, Timer};

/// Complete chip state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McuState {
    /// Whether the controller is in the running state.
    pub running: bool,
    /// Core clock in Hz.
    pub frequency: u32,
    /// Register file.
    pub registers: RegisterFile,
    /// GPIO bank.
    pub gpio: GpioBank,
    /// Timer descriptors.
    pub timers: Vec<Timer>,
    /// Serial transfer log.
    pub serial: SerialLog,
    /// Character LCD.
    pub lcd: Lcd,
    /// Temperature sensor.
    pub temperature: TemperatureSensor,
    /// Motor driver output.
    #[serde(flatten)]
    pub motor: Motor,
}

impl McuState {
    /// Builds the power-on state described by `config`.
    pub fn new(config: &Config) -> Self {
        let board = &config.board;
        Self {
            running: false,
            frequency: config.general.frequency_hz,
            registers: RegisterFile::new(),
            gpio: GpioBank::new(),
            timers: (0..board.timer_count)
                .map(|id| Timer::new(id, board.timer_period, board.timer_prescaler))
                .collect(),
            serial: SerialLog::new(),
            lcd: Lcd::new(board.lcd_width, board.lcd_height, board.lcd_backlight),
            temperature: TemperatureSensor::new(
                config.general.initial_temperature,
                board.temperature_min,
                board.temperature_max,
            ),
            motor: Motor::default(),
        }
    }

    /// Serializes the state to the JSON snapshot shape.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Default for McuState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
