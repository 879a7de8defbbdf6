//! WebAssembly bindings for the microcontroller simulator.
//!
//! Exposes [`WasmSimulator`] to JavaScript. State, results and statistics
//! cross the boundary as JSON strings in the same camelCase shape the core
//! serializes.
//!
//! ```typescript
//! import { WasmSimulator } from 'mcusim-wasm';
//!
//! const sim = new WasmSimulator();
//! sim.onStateChange((json) => render(JSON.parse(json)));
//! const result = JSON.parse(sim.executeCode(source));
//! if (result.success) {
//!   sim.start();
//!   setInterval(() => sim.tick(16), 16);
//! }
//! ```

use serde::Serialize;
use wasm_bindgen::prelude::*;

use mcusim_core::common::clock::Clock;
use mcusim_core::config::Config;
use mcusim_core::soc::McuState;
use mcusim_core::Simulator;

/// Step budget used when the configuration sets none.
///
/// The browser build has no monotonic clock, so the wall-clock timeout is
/// replaced by a step limit.
const DEFAULT_MAX_STEPS: u64 = 5_000_000;

/// [`Clock`] backed by `Date.now()`.
#[derive(Debug, Default, Clone, Copy)]
struct JsClock;

impl Clock for JsClock {
    fn now_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// Outcome of one `tick`, serialized as `{ fired, error? }`.
#[derive(Debug, Serialize)]
struct TickReport {
    fired: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// The simulator, as seen from JavaScript.
#[wasm_bindgen]
#[derive(Debug)]
pub struct WasmSimulator {
    inner: Simulator,
}

#[wasm_bindgen]
impl WasmSimulator {
    /// Creates a simulator from an optional JSON configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Self, JsValue> {
        let mut config = match config_json {
            Some(text) => Config::from_json(&text).map_err(to_js_error)?,
            None => Config::default(),
        };
        config.execution.timeout_ms = None;
        config.execution.max_steps.get_or_insert(DEFAULT_MAX_STEPS);

        Ok(Self {
            inner: Simulator::new(config).with_clock(JsClock),
        })
    }

    /// Runs a program; returns the execution result as JSON.
    #[wasm_bindgen(js_name = executeCode)]
    pub fn execute_code(&mut self, source: &str) -> Result<String, JsValue> {
        self.inner.execute_code(source).to_json().map_err(to_js_error)
    }

    /// Marks the board as running.
    pub fn start(&mut self) {
        self.inner.start();
    }

    /// Stops the board and cancels the program's callbacks.
    pub fn stop(&mut self) {
        self.inner.stop();
    }

    /// Restores the power-on state.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Advances the program's virtual clock; returns `{ fired, error? }` as JSON.
    pub fn tick(&mut self, elapsed_ms: f64) -> Result<String, JsValue> {
        let elapsed = if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            elapsed_ms as u64
        } else {
            0
        };
        let report = match self.inner.tick(elapsed) {
            Ok(fired) => TickReport { fired, error: None },
            Err(e) => TickReport {
                fired: 0,
                error: Some(e.to_string()),
            },
        };
        serde_json::to_string(&report).map_err(to_js_error)
    }

    /// Moves the temperature reading by `delta` °C.
    #[wasm_bindgen(js_name = simulateTemperatureChange)]
    pub fn simulate_temperature_change(&mut self, delta: f64) {
        self.inner.simulate_temperature_change(delta);
    }

    /// Drives an input pin from outside the chip.
    #[wasm_bindgen(js_name = simulateGpioInput)]
    pub fn simulate_gpio_input(&mut self, pin: usize, value: bool) {
        self.inner.simulate_gpio_input(pin, value);
    }

    /// Logs `data` as received on the serial port.
    #[wasm_bindgen(js_name = simulateSerialInput)]
    pub fn simulate_serial_input(&mut self, data: &str) {
        self.inner.simulate_serial_input(data);
    }

    /// Current state as JSON.
    pub fn state(&self) -> Result<String, JsValue> {
        self.inner.state().to_json().map_err(to_js_error)
    }

    /// `"idle"`, `"running"` or `"stopped"`.
    pub fn status(&self) -> String {
        self.inner.status().to_string()
    }

    /// Activity counters as JSON.
    pub fn stats(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.inner.stats()).map_err(to_js_error)
    }

    /// Installs `callback(stateJson)`, replacing any previous subscriber.
    #[wasm_bindgen(js_name = onStateChange)]
    pub fn on_state_change(&mut self, callback: js_sys::Function) {
        self.inner.on_state_change(move |state: &McuState| {
            let payload = match state.to_json() {
                Ok(json) => JsValue::from_str(&json),
                Err(e) => return web_sys::console::error_1(&to_js_error(e)),
            };
            if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
                web_sys::console::error_1(&e);
            }
        });
    }

    /// Removes the state-change subscriber.
    #[wasm_bindgen(js_name = clearListener)]
    pub fn clear_listener(&mut self) -> bool {
        self.inner.clear_listener()
    }
}
