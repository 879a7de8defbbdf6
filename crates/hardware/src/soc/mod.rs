//! System-on-Chip (SoC) Components.
//!
//! This module organizes the peripheral models that make up the simulated
//! microcontroller and the aggregate state that owns them.

/// Peripheral device models.
pub mod devices;

/// Aggregate chip state.
pub mod state;

pub use state::McuState;
