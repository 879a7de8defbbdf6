//! Simulation controller.
//!
//! The [`Simulator`] owns the chip state, the script engine and the single
//! state-change subscriber. It implements the lifecycle
//!
//! ```text
//! Idle --start--> Running --stop--> Stopped --reset--> Idle
//! ```
//!
//! and the host-side stimulus operations (temperature drift, GPIO input,
//! serial receive). Programs run through [`Simulator::execute_code`]; callbacks
//! they schedule fire from [`Simulator::tick`] while the controller is running.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::common::clock::{Clock, SystemClock};
use crate::common::error::ScriptError;
use crate::config::Config;
use crate::script::{Interpreter, Limits, ScriptEngine};
use crate::sim::context::ExecutionContext;
use crate::sim::observer::ChangeNotifier;
use crate::sim::result::ExecutionResult;
use crate::soc::McuState;
use crate::soc::devices::Direction;
use crate::stats::SimStats;

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimStatus {
    /// Constructed or freshly reset.
    #[default]
    Idle,
    /// Started; periodic callbacks fire on `tick`.
    Running,
    /// Stopped; callbacks were cancelled, state is kept.
    Stopped,
}

impl fmt::Display for SimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// The simulation controller.
///
/// # Examples
///
/// ```
/// use mcusim_core::Simulator;
///
/// let mut sim = Simulator::default();
/// let result = sim.execute_code("pinMode(0, 'output'); digitalWrite(0, true);");
/// assert!(result.success);
/// assert!(sim.state().gpio.read(0));
/// ```
pub struct Simulator<E: ScriptEngine = Interpreter> {
    config: Config,
    state: McuState,
    status: SimStatus,
    engine: E,
    notifier: ChangeNotifier,
    clock: Box<dyn Clock>,
    stats: SimStats,
}

impl Simulator<Interpreter> {
    /// Creates a simulator running the built-in interpreter.
    pub fn new(config: Config) -> Self {
        let engine = Interpreter::new(Limits::from(&config.execution));
        Self::with_engine(config, engine)
    }
}

impl Default for Simulator<Interpreter> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<E: ScriptEngine> Simulator<E> {
    /// Creates a simulator driven by a custom script engine.
    pub fn with_engine(config: Config, engine: E) -> Self {
        Self {
            state: McuState::new(&config),
            config,
            status: SimStatus::Idle,
            engine,
            notifier: ChangeNotifier::new(),
            clock: Box::new(SystemClock),
            stats: SimStats::default(),
        }
    }

    /// Replaces the wall clock used for serial timestamps and `Date.now()`.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Runs `source` against the current state.
    ///
    /// Mutations made before a failure persist unless
    /// `execution.rollback_on_error` is set, in which case the pre-execution
    /// state is restored, scheduled callbacks are cancelled and the subscriber
    /// is notified once if the failed run had changed anything.
    pub fn execute_code(&mut self, source: &str) -> ExecutionResult {
        self.stats.executions += 1;
        let checkpoint = self
            .config
            .execution
            .rollback_on_error
            .then(|| self.state.clone());

        let outcome = {
            let mut context = ExecutionContext::new(
                &mut self.state,
                &mut self.notifier,
                self.clock.as_ref(),
                &mut self.stats,
            );
            self.engine.run(source, &mut context)
        };
        self.stats.script_steps = self.stats.script_steps.saturating_add(self.engine.steps());

        match outcome {
            Ok(()) => ExecutionResult::success(self.state.clone()),
            Err(err) => {
                self.stats.failed_executions += 1;
                warn!(error = %err, "execution failed");
                if let Some(checkpoint) = checkpoint {
                    self.engine.cancel_callbacks();
                    if checkpoint != self.state {
                        self.state = checkpoint;
                        info!("state rolled back");
                        self.changed();
                    }
                }
                ExecutionResult::failure(&err)
            }
        }
    }

    /// Marks the chip as running.
    pub fn start(&mut self) {
        self.status = SimStatus::Running;
        self.state.running = true;
        info!("simulation started");
        self.changed();
    }

    /// Marks the chip as stopped and cancels scheduled callbacks.
    pub fn stop(&mut self) {
        self.status = SimStatus::Stopped;
        self.state.running = false;
        self.engine.cancel_callbacks();
        info!("simulation stopped");
        self.changed();
    }

    /// Stops, then rebuilds the power-on state.
    pub fn reset(&mut self) {
        self.stop();
        self.state = McuState::new(&self.config);
        self.status = SimStatus::Idle;
        info!("simulation reset");
        self.changed();
    }

    /// Advances the program's virtual clock by `elapsed_ms`.
    ///
    /// Fires due callbacks and returns how many ran. Does nothing unless the
    /// controller is [`SimStatus::Running`]. A failing callback is reported
    /// here; the controller keeps running.
    pub fn tick(&mut self, elapsed_ms: u64) -> Result<usize, ScriptError> {
        if self.status != SimStatus::Running {
            return Ok(0);
        }

        let steps_before = self.engine.steps();
        let outcome = {
            let mut context = ExecutionContext::new(
                &mut self.state,
                &mut self.notifier,
                self.clock.as_ref(),
                &mut self.stats,
            );
            self.engine.advance(elapsed_ms, &mut context)
        };
        let spent = self.engine.steps().saturating_sub(steps_before);
        self.stats.script_steps = self.stats.script_steps.saturating_add(spent);

        match outcome {
            Ok(fired) => {
                self.stats.loop_callbacks += fired as u64;
                Ok(fired)
            }
            Err(err) => {
                self.stats.loop_failures += 1;
                warn!(error = %err, "periodic callback failed");
                Err(err)
            }
        }
    }

    /// Moves the sensor reading by `delta` °C, clamped to the sensor range.
    pub fn simulate_temperature_change(&mut self, delta: f64) {
        self.state.temperature.drift(delta);
        self.changed();
    }

    /// Drives an input pin from outside the chip. Output and unknown pins are ignored.
    pub fn simulate_gpio_input(&mut self, pin: usize, value: bool) {
        if self.state.gpio.drive_input(pin, value) {
            self.changed();
        }
    }

    /// Logs `data` as received on the serial port.
    pub fn simulate_serial_input(&mut self, data: &str) {
        let timestamp = self.clock.now_millis();
        self.state.serial.push(timestamp, Direction::Rx, data);
        self.changed();
    }

    /// Installs the state-change subscriber, replacing any previous one.
    pub fn on_state_change(&mut self, listener: impl FnMut(&McuState) + 'static) {
        self.notifier.subscribe(listener);
    }

    /// Removes the subscriber. Returns `true` if one was installed.
    pub fn clear_listener(&mut self) -> bool {
        self.notifier.unsubscribe()
    }

    /// Shared view of the current state.
    pub const fn state(&self) -> &McuState {
        &self.state
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> McuState {
        self.state.clone()
    }

    /// Current lifecycle state.
    pub const fn status(&self) -> SimStatus {
        self.status
    }

    /// Returns `true` between `start` and `stop`/`reset`.
    pub fn is_running(&self) -> bool {
        self.status == SimStatus::Running
    }

    /// Active configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Activity counters.
    pub const fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// The script engine.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the script engine.
    pub const fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn changed(&mut self) {
        self.stats.notifications += 1;
        self.notifier.notify(&self.state);
    }
}

impl<E: ScriptEngine> fmt::Debug for Simulator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("status", &self.status)
            .field("pending_callbacks", &self.engine.pending_callbacks())
            .field("notifier", &self.notifier)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
