//! # Unit Components
//!
//! Tests grouped by crate layer: peripheral models, the script engine, the
//! simulation controller, configuration loading and statistics.

/// Configuration defaults and JSON loading.
pub mod config;

/// Script language: evaluation, scheduling and execution limits.
pub mod script;

/// Execution context, controller lifecycle and notification.
pub mod sim;

/// Peripheral models and the aggregate state.
pub mod soc;
