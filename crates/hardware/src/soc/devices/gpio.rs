//! General-Purpose I/O bank.
//!
//! Models three 8-pin ports (`PA0..PA7`, `PB0..PB7`, `PC0..PC7`) as one flat,
//! fixed-size sequence indexed by pin id. All accessors bounds-check the index
//! and degrade to a no-op (or `false`) when it is out of range.
//!
//! # Direction rules
//!
//! * Script writes (`write`) only land on pins in [`PinMode::Output`].
//! * External stimulus (`drive_input`) only lands on pins in [`PinMode::Input`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::common::constants::{GPIO_PORTS, PINS_PER_PORT};

/// Direction of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PinMode {
    /// High-impedance input; driven from outside the chip.
    #[default]
    Input,
    /// Push-pull output; driven by the program.
    Output,
}

impl FromStr for PinMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// A single GPIO pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpioPin {
    /// Stable index into the bank.
    pub id: usize,
    /// Current direction.
    pub mode: PinMode,
    /// Logic level.
    pub state: bool,
    /// Port-qualified name, e.g. `"PB3"`.
    pub name: String,
}

/// The full GPIO bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GpioBank {
    pins: Vec<GpioPin>,
}

impl GpioBank {
    /// Creates the bank with every pin in `input` mode, driven low.
    pub fn new() -> Self {
        let pins = GPIO_PORTS
            .iter()
            .enumerate()
            .flat_map(|(port_index, port)| {
                (0..PINS_PER_PORT).map(move |bit| GpioPin {
                    id: port_index * PINS_PER_PORT + bit,
                    mode: PinMode::Input,
                    state: false,
                    name: format!("P{port}{bit}"),
                })
            })
            .collect();
        Self { pins }
    }

    /// Number of pins in the bank.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Returns `true` if the bank has no pins.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Returns the pin at `pin`, if it exists.
    pub fn pin(&self, pin: usize) -> Option<&GpioPin> {
        self.pins.get(pin)
    }

    /// Iterates over all pins in id order.
    pub fn iter(&self) -> impl Iterator<Item = &GpioPin> {
        self.pins.iter()
    }

    /// Sets the direction of `pin`.
    ///
    /// Returns `true` if the pin exists (the call counts as a state change).
    pub fn set_mode(&mut self, pin: usize, mode: PinMode) -> bool {
        match self.pins.get_mut(pin) {
            Some(p) => {
                p.mode = mode;
                true
            }
            None => false,
        }
    }

    /// Drives `pin` from the program side.
    ///
    /// Ignored for unknown pins and for pins configured as inputs.
    pub fn write(&mut self, pin: usize, value: bool) -> bool {
        match self.pins.get_mut(pin) {
            Some(p) if p.mode == PinMode::Output => {
                p.state = value;
                true
            }
            _ => false,
        }
    }

    /// Reads the logic level of `pin`; unknown pins read low.
    pub fn read(&self, pin: usize) -> bool {
        self.pins.get(pin).is_some_and(|p| p.state)
    }

    /// Drives `pin` from outside the chip.
    ///
    /// Ignored for unknown pins and for pins configured as outputs.
    pub fn drive_input(&mut self, pin: usize, value: bool) -> bool {
        match self.pins.get_mut(pin) {
            Some(p) if p.mode == PinMode::Input => {
                p.state = value;
                true
            }
            _ => false,
        }
    }
}

impl Default for GpioBank {
    fn default() -> Self {
        Self::new()
    }
}
