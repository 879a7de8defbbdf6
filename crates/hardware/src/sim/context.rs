//! Execution context: the capability surface user programs run against.
//!
//! An [`ExecutionContext`] mutably borrows the chip state for exactly one
//! engine invocation and is rebuilt for the next one, so a program can never
//! hold on to a state that a later `reset` replaced. It offers:
//! 1. **Typed operations:** `pin_mode`, `digital_write`, `lcd_print`, ... used directly by Rust callers.
//! 2. **Script dispatch:** the [`Host`] implementation, which coerces loosely
//!    typed script arguments and forwards to the typed operations.
//!
//! Every operation fails closed: out-of-range pins, unknown register
//! addresses, invalid rows and unknown mode or direction strings are silent
//! no-ops (reads return defaults). Each effective mutation signals a change.

use tracing::debug;

use crate::common::clock::Clock;
use crate::common::error::ScriptError;
use crate::script::{Host, Value};
use crate::sim::observer::ChangeNotifier;
use crate::soc::McuState;
use crate::soc::devices::{Direction, MotorDirection, PinMode};
use crate::stats::SimStats;

/// Names of the functions exposed to scripts.
pub const CAPABILITIES: &[&str] = &[
    "pinMode",
    "digitalWrite",
    "digitalRead",
    "writeRegister",
    "readRegister",
    "serialWrite",
    "lcdClear",
    "lcdPrint",
    "readTemperature",
    "setMotor",
    "delay",
    "console.log",
];

/// Borrowed view of the simulator handed to one script invocation.
pub struct ExecutionContext<'a> {
    state: &'a mut McuState,
    notifier: &'a mut ChangeNotifier,
    clock: &'a dyn Clock,
    stats: &'a mut SimStats,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context over `state`.
    pub fn new(
        state: &'a mut McuState,
        notifier: &'a mut ChangeNotifier,
        clock: &'a dyn Clock,
        stats: &'a mut SimStats,
    ) -> Self {
        Self {
            state,
            notifier,
            clock,
            stats,
        }
    }

    /// Read-only access to the borrowed state.
    pub fn state(&self) -> &McuState {
        self.state
    }

    fn changed(&mut self) {
        self.stats.notifications += 1;
        self.notifier.notify(self.state);
    }

    /// Configures a pin's direction.
    pub fn pin_mode(&mut self, pin: usize, mode: PinMode) {
        if self.state.gpio.set_mode(pin, mode) {
            self.changed();
        }
    }

    /// Drives an output pin. Input pins and unknown pins are left alone.
    pub fn digital_write(&mut self, pin: usize, value: bool) {
        if self.state.gpio.write(pin, value) {
            self.changed();
        }
    }

    /// Reads a pin; unknown pins read `false`.
    pub fn digital_read(&self, pin: usize) -> bool {
        self.state.gpio.read(pin)
    }

    /// Stores `value & 0xFF` at `address` if a register lives there.
    pub fn write_register(&mut self, address: u8, value: i64) {
        if self.state.registers.write(address, value) {
            self.changed();
        }
    }

    /// Reads the register at `address`; unknown addresses read `0`.
    pub fn read_register(&self, address: u8) -> u8 {
        self.state.registers.read(address)
    }

    /// Appends a transmitted line to the serial log.
    pub fn serial_write(&mut self, data: &str) {
        let timestamp = self.clock.now_millis();
        self.state.serial.push(timestamp, Direction::Tx, data);
        self.changed();
    }

    /// Blanks the LCD.
    pub fn lcd_clear(&mut self) {
        self.state.lcd.clear();
        self.changed();
    }

    /// Prints `text` at `(row, col)`; see [`Lcd::print`](crate::soc::devices::Lcd::print).
    pub fn lcd_print(&mut self, row: usize, col: i64, text: &str) {
        if self.state.lcd.print(row, col, text) {
            self.changed();
        }
    }

    /// Current sensor reading in °C.
    pub fn read_temperature(&self) -> f64 {
        self.state.temperature.read()
    }

    /// Sets motor speed (clamped to `0..=255`) and direction.
    pub fn set_motor(&mut self, speed: i64, direction: MotorDirection) {
        self.state.motor.set(speed, direction);
        self.changed();
    }

    /// Records a delay request. Never blocks.
    pub fn delay(&mut self, ms: f64) {
        debug!(ms, "delay requested");
        if ms.is_finite() && ms > 0.0 {
            self.stats.delay_requested_ms = self.stats.delay_requested_ms.saturating_add(ms as u64);
        }
    }

    /// `console.log`: logs `message` to the serial port as a transmitted line.
    pub fn log(&mut self, message: &str) {
        self.serial_write(message);
    }
}

/// Pin index, address, or row argument: a finite non-negative integer.
fn index_arg(args: &[Value], position: usize) -> Option<usize> {
    args.get(position).and_then(Value::as_index)
}

fn text_arg(args: &[Value], position: usize) -> String {
    args.get(position).cloned().unwrap_or_default().to_js_string()
}

fn enum_arg<T: std::str::FromStr>(args: &[Value], position: usize) -> Option<T> {
    match args.get(position) {
        Some(Value::Str(text)) => text.parse().ok(),
        _ => None,
    }
}

impl Host for ExecutionContext<'_> {
    fn capabilities(&self) -> &[&'static str] {
        CAPABILITIES
    }

    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
        self.stats.capability_calls += 1;
        debug!(capability = name, argc = args.len(), "capability call");

        match name {
            "pinMode" => {
                if let (Some(pin), Some(mode)) = (index_arg(args, 0), enum_arg::<PinMode>(args, 1)) {
                    self.pin_mode(pin, mode);
                }
            }
            "digitalWrite" => {
                if let Some(pin) = index_arg(args, 0) {
                    let value = args.get(1).is_some_and(Value::truthy);
                    self.digital_write(pin, value);
                }
            }
            "digitalRead" => {
                let level = index_arg(args, 0).is_some_and(|pin| self.digital_read(pin));
                return Ok(Value::Bool(level));
            }
            "writeRegister" => {
                let address = index_arg(args, 0).and_then(|a| u8::try_from(a).ok());
                if let Some(address) = address {
                    let value = args.get(1).map_or(0, Value::to_int32);
                    self.write_register(address, i64::from(value));
                }
            }
            "readRegister" => {
                let value = index_arg(args, 0)
                    .and_then(|a| u8::try_from(a).ok())
                    .map_or(0, |address| self.read_register(address));
                return Ok(Value::Number(f64::from(value)));
            }
            "serialWrite" => {
                let data = text_arg(args, 0);
                self.serial_write(&data);
            }
            "lcdClear" => self.lcd_clear(),
            "lcdPrint" => {
                let col = args
                    .get(1)
                    .map(Value::to_number)
                    .filter(|c| c.is_finite() && c.fract() == 0.0);
                if let (Some(row), Some(col)) = (index_arg(args, 0), col) {
                    let text = text_arg(args, 2);
                    self.lcd_print(row, col as i64, &text);
                }
            }
            "readTemperature" => return Ok(Value::Number(self.read_temperature())),
            "setMotor" => {
                if let Some(direction) = enum_arg::<MotorDirection>(args, 1) {
                    let speed = args.first().map_or(f64::NAN, Value::to_number);
                    let speed = if speed.is_nan() { 0 } else { speed.trunc() as i64 };
                    self.set_motor(speed, direction);
                }
            }
            "delay" => {
                let ms = args.first().map_or(0.0, Value::to_number);
                self.delay(ms);
            }
            "console.log" => {
                let line = args
                    .iter()
                    .map(Value::to_js_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                self.log(&line);
            }
            other => return Err(ScriptError::Reference(other.to_string())),
        }
        Ok(Value::Undefined)
    }

    fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }
}
