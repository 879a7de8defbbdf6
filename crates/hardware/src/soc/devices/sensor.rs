//! Simulated temperature sensor.
//!
//! The program only reads the sensor; the host moves it with bounded drift to
//! emulate environmental change.

use serde::Serialize;

/// Analog temperature sensor, serialized as its bare reading in °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemperatureSensor {
    celsius: f64,
    #[serde(skip)]
    min: f64,
    #[serde(skip)]
    max: f64,
}

impl TemperatureSensor {
    /// Creates a sensor reading `celsius`, with drift clamped to `[min, max]`.
    pub const fn new(celsius: f64, min: f64, max: f64) -> Self {
        Self { celsius, min, max }
    }

    /// Current reading in °C.
    pub const fn read(&self) -> f64 {
        self.celsius
    }

    /// Lowest reachable reading.
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Highest reachable reading.
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Adds `delta` to the reading and clamps the result to the sensor range.
    ///
    /// A non-finite `delta` leaves the reading unchanged. An inverted range
    /// pins the reading to `max`.
    pub fn drift(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.celsius = (self.celsius + delta).max(self.min).min(self.max);
    }
}
