//! Script execution.
//!
//! User programs are written in a small dynamically typed scripting language
//! (C-like statements, closures, arrays and objects). This module provides:
//! 1. **Front end:** [`lexer`] and [`parser`] producing the [`ast`].
//! 2. **Runtime:** [`Value`], lexical [`scope`]s and the standard library in [`builtins`].
//! 3. **Engine:** the [`Interpreter`], the default [`ScriptEngine`].
//!
//! The engine reaches peripherals only through a [`Host`]: every capability the
//! host advertises becomes a global function (or a member of a namespace object
//! for dotted names such as `console.log`).

pub mod ast;
pub mod builtins;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod value;

pub use interpreter::{Interpreter, Limits};
pub use value::Value;

use crate::common::error::ScriptError;

/// The capability surface a script runs against.
pub trait Host {
    /// Names of the functions to expose to scripts.
    fn capabilities(&self) -> &[&'static str];

    /// Invokes capability `name` with already-evaluated arguments.
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, ScriptError>;

    /// Wall-clock milliseconds since the Unix epoch, read by `Date.now()`.
    fn now_millis(&self) -> u64 {
        0
    }
}

/// An engine that runs user programs against a [`Host`].
pub trait ScriptEngine {
    /// Parses and runs `source` to completion.
    ///
    /// Starting a new program cancels every callback the previous one scheduled.
    /// Parsing finishes before any statement runs, so a syntax error reaches the
    /// host without side effects.
    fn run(&mut self, source: &str, host: &mut dyn Host) -> Result<(), ScriptError>;

    /// Moves the engine's virtual clock forward and fires due callbacks.
    ///
    /// Returns the number of callbacks that ran. The first callback error stops
    /// the advance; callbacks that were not yet reached stay scheduled.
    fn advance(&mut self, elapsed_ms: u64, host: &mut dyn Host) -> Result<usize, ScriptError>;

    /// Number of scheduled callbacks.
    fn pending_callbacks(&self) -> usize;

    /// Drops every scheduled callback.
    fn cancel_callbacks(&mut self);

    /// Evaluation steps charged since the last [`run`](Self::run).
    fn steps(&self) -> u64 {
        0
    }
}
