//! Scripted engine for controller tests.
//!
//! `FakeEngine` ignores the program text. On `run` it replays a fixed list of
//! capability calls against the host, then returns the configured outcome.

use mcusim_core::common::error::ScriptError;
use mcusim_core::script::{Host, ScriptEngine, Value};

#[derive(Debug, Default)]
pub struct FakeEngine {
    /// Capability calls replayed by every `run`.
    pub calls: Vec<(String, Vec<Value>)>,
    /// Error returned after the calls, if any.
    pub fail_with: Option<ScriptError>,
    /// Sources passed to `run`, in order.
    pub sources: Vec<String>,
    /// Callbacks reported as pending.
    pub pending: usize,
    /// Number of `cancel_callbacks` calls.
    pub cancelled: usize,
    /// Total elapsed time passed to `advance`.
    pub advanced_ms: u64,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call(mut self, name: &str, args: Vec<Value>) -> Self {
        self.calls.push((name.to_string(), args));
        self
    }

    pub fn failing(mut self, error: ScriptError) -> Self {
        self.fail_with = Some(error);
        self
    }
}

impl ScriptEngine for FakeEngine {
    fn run(&mut self, source: &str, host: &mut dyn Host) -> Result<(), ScriptError> {
        self.sources.push(source.to_string());
        for (name, args) in &self.calls {
            let _ = host.call(name, args)?;
        }
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn advance(&mut self, elapsed_ms: u64, _host: &mut dyn Host) -> Result<usize, ScriptError> {
        self.advanced_ms += elapsed_ms;
        Ok(self.pending)
    }

    fn pending_callbacks(&self) -> usize {
        self.pending
    }

    fn cancel_callbacks(&mut self) {
        self.cancelled += 1;
        self.pending = 0;
    }
}
