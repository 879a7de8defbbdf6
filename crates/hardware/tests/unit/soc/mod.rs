//! Peripheral model tests.

/// GPIO bank direction rules and bounds.
pub mod gpio;

/// Character LCD clipping and clearing.
pub mod lcd;

/// Motor driver, temperature sensor and timers.
pub mod peripherals;


/// Serial log ordering and windowing.
pub mod serial;

/// Aggregate state construction and JSON shape.
pub mod state;
