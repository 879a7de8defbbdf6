//! Global Board Constants.
//!
//! This module defines the fixed characteristics of the simulated board. It includes:
//! 1. **GPIO Layout:** Port letters, pins per port, and the resulting pin count.
//! 2. **Data Widths:** The register mask and the motor driver speed range.
//! 3. **Lifecycle Defaults:** Values the aggregate state is rebuilt with on reset.

/// GPIO port letters, in pin-index order.
pub const GPIO_PORTS: [char; 3] = ['A', 'B', 'C'];

/// Number of pins in each GPIO port.
pub const PINS_PER_PORT: usize = 8;

/// Total number of GPIO pins (three 8-pin ports).
pub const GPIO_PIN_COUNT: usize = GPIO_PORTS.len() * PINS_PER_PORT;

/// Mask applied to every register write (registers are 8 bits wide).
pub const REGISTER_MASK: i64 = 0xFF;

/// Highest speed the motor driver accepts.
pub const MOTOR_MAX_SPEED: u8 = 255;

/// Character every LCD cell holds after a clear.
pub const LCD_BLANK: char = ' ';

/// Number of most recent serial entries shown by default in text renderings.
pub const SERIAL_WINDOW: usize = 20;
