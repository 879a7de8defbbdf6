//! DC motor driver.
//!
//! A pure output register pair: an 8-bit speed and a rotation direction. No
//! motion is integrated over time.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::common::constants::MOTOR_MAX_SPEED;

/// Rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorDirection {
    /// Clockwise.
    Cw,
    /// Counter-clockwise.
    Ccw,
    /// Braked.
    #[default]
    Stop,
}

impl FromStr for MotorDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cw" => Ok(Self::Cw),
            "ccw" => Ok(Self::Ccw),
            "stop" => Ok(Self::Stop),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MotorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cw => write!(f, "cw"),
            Self::Ccw => write!(f, "ccw"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// Motor driver output, flattened into the snapshot as `motorSpeed` / `motorDirection`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Motor {
    /// Duty value in `0..=255`.
    #[serde(rename = "motorSpeed")]
    pub speed: u8,
    /// Rotation direction.
    #[serde(rename = "motorDirection")]
    pub direction: MotorDirection,
}

impl Motor {
    /// Sets speed (clamped to `0..=255`) and direction.
    pub fn set(&mut self, speed: i64, direction: MotorDirection) {
        self.speed = speed.clamp(0, i64::from(MOTOR_MAX_SPEED)) as u8;
        self.direction = direction;
    }
}
