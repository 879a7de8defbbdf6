//! Simulation layer tests.



/// Bundled demo programs.
pub mod demos;

/// Controller behaviour with a scripted engine.
pub mod engine_seam;

/// Single-subscriber notification.
pub mod observer;

/// Property tests for the peripheral invariants.
pub mod properties;
