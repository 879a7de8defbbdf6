//! Script engine tests, driven through the simulator.


/// Execution budget, call depth and size limits.
pub mod limits;

/// `setInterval` / `setTimeout` on the virtual clock.
pub mod scheduling;
