//! Peripheral Devices.
//!
//! This module contains the peripheral models found on the simulated board:
//! GPIO ports, the register file, timers, the serial port, a character LCD,
//! an analog temperature sensor and a DC motor driver.

/// General-purpose I/O bank.
pub mod gpio;

/// Character LCD frame buffer.
pub mod lcd;

/// DC motor driver output.
pub mod motor;

/// Named 8-bit register file.
pub mod registers;

/// Analog temperature sensor.
pub mod sensor;

/// Timer/counter descriptors.
pub mod timer;

/// Serial port transfer log.
pub mod uart;

pub use gpio::{GpioBank, GpioPin, PinMode};
pub use lcd::Lcd;
pub use motor::{Motor, MotorDirection};
pub use registers::{Register, RegisterFile};
pub use sensor::TemperatureSensor;
pub use timer::Timer;
pub use uart::{Direction, SerialEntry, SerialLog};
