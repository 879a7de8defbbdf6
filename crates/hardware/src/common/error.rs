//! Error definitions.
//!
//! This module defines the two error families surfaced by the simulator core:
//! 1. **Script Errors:** Faults raised while lexing, parsing, or evaluating user script.
//! 2. **Configuration Errors:** Failures loading or decoding a JSON configuration.
//!
//! Peripheral access never produces an error; out-of-range accesses degrade to
//! no-ops or default values inside the device models.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fault raised by the script engine while running user code.
///
/// Every variant is caught by [`Simulator::execute_code`](crate::sim::Simulator::execute_code)
/// and converted into a failed [`ExecutionResult`](crate::sim::ExecutionResult).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// The source text could not be tokenized or parsed.
    #[error("SyntaxError: {message} (line {line}, column {column})")]
    Syntax {
        /// Description of the offending construct.
        message: String,
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        column: usize,
    },

    /// A name was read or called that has no binding in scope.
    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    /// An operation was applied to a value of the wrong kind.
    #[error("TypeError: {0}")]
    Type(String),

    /// A value exceeded a size limit (string or array length).
    #[error("RangeError: {0}")]
    Range(String),

    /// The script threw a value that no `catch` block handled.
    #[error("Uncaught {0}")]
    Thrown(String),

    /// Nested calls exceeded the configured maximum depth.
    #[error("RangeError: Maximum call stack size exceeded ({limit} frames)")]
    CallDepth {
        /// Configured frame limit.
        limit: usize,
    },

    /// The invocation exceeded its execution budget.
    #[error("execution timeout: {0}")]
    Timeout(Budget),
}

impl ScriptError {
    /// Returns `true` if a script-level `try/catch` may intercept this error.
    ///
    /// Budget and call-depth faults always unwind to the host.
    pub const fn is_catchable(&self) -> bool {
        !matches!(self, Self::Timeout(_) | Self::CallDepth { .. })
    }
}

/// The execution budget that was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Budget {
    /// Wall-clock limit in milliseconds.
    #[error("script ran longer than {0} ms")]
    WallClock(u64),
    /// Evaluation step limit.
    #[error("script exceeded {0} evaluation steps")]
    Steps(u64),
}

/// Failure loading a [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration text is not valid JSON for [`Config`](crate::config::Config).
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration decoded but holds inconsistent values.
    #[error("invalid config: {0}")]
    Invalid(String),
}
