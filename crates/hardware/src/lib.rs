//! Microcontroller simulator library.
//!
//! This crate models a generic microcontroller board and runs user programs
//! against it:
//! 1. **SoC:** GPIO, registers, timers, serial log, LCD, temperature sensor and motor driver.
//! 2. **Script:** Lexer, parser and tree-walking interpreter for a JavaScript-like language.
//! 3. **Simulation:** Execution context, controller lifecycle and change notification.
//! 4. **Support:** Configuration, error types and statistics.
//!
//! # Examples
//!
//! ```
//! use mcusim_core::{Config, Simulator};
//!
//! let mut sim = Simulator::new(Config::default());
//! let result = sim.execute_code("lcdPrint(0, 0, 'Hello'); setMotor(300, 'cw');");
//! assert!(result.success);
//! assert_eq!(sim.state().lcd.row_text(0).as_deref(), Some("Hello           "));
//! assert_eq!(sim.state().motor.speed, 255);
//! ```

/// Common types and constants (clock, errors, board layout).
pub mod common;
/// Simulator configuration (defaults and hierarchical config structures).
pub mod config;
/// Script language front end and interpreter.
pub mod script;
/// Execution context, controller and notification.
pub mod sim;
/// Peripheral models and the aggregate chip state.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Error raised by script execution.
pub use crate::common::error::ScriptError;
/// Engine seam and the built-in interpreter.
pub use crate::script::{Host, Interpreter, ScriptEngine, Value};
/// Controller and execution types.
pub use crate::sim::{ExecutionContext, ExecutionResult, SimStatus, Simulator};
/// Aggregate chip state.
pub use crate::soc::McuState;
/// Activity counters.
pub use crate::stats::SimStats;
