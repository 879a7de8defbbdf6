//! Hardware timer descriptors.
//!
//! Timers are part of the observable model but nothing advances them: there is
//! no internal clock, so `counter` only changes if a host writes it directly.

use serde::Serialize;

/// A timer/counter unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timer {
    /// Timer index.
    pub id: usize,
    /// Whether the timer is enabled.
    pub enabled: bool,
    /// Current count.
    pub counter: u32,
    /// Overflow period.
    pub period: u32,
    /// Clock prescaler.
    pub prescaler: u32,
}

impl Timer {
    /// Creates a disabled timer with a zeroed counter.
    pub const fn new(id: usize, period: u32, prescaler: u32) -> Self {
        Self {
            id,
            enabled: false,
            counter: 0,
            period,
            prescaler,
        }
    }
}
