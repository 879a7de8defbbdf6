//! Common utilities and types used throughout the microcontroller simulator.
//!
//! This module provides the building blocks shared by the device models, the
//! script engine and the controller:
//! 1. **Constants:** Board layout and data-width constants.
//! 2. **Error Handling:** Script faults and configuration errors.
//! 3. **Time:** The millisecond clock used for serial timestamps and `Date.now()`.

/// Board-wide constants.
pub mod constants;

/// Error types for script execution and configuration loading.
pub mod error;

/// Host clock abstraction.
pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};
pub use constants::GPIO_PIN_COUNT;
pub use error::{Budget, ConfigError, ScriptError};
