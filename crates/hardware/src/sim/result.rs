//! Outcome of one `execute_code` request.

use serde::Serialize;

use crate::common::error::ScriptError;
use crate::soc::McuState;

/// `output` text of a successful execution.
pub const SUCCESS_OUTPUT: &str = "Code executed successfully";

/// Structured execution outcome, serialized as `{ success, output, error?, state? }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// Whether the program ran to completion.
    pub success: bool,
    /// Human-readable summary; empty on failure.
    pub output: String,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// State snapshot taken after a successful run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<McuState>,
}

impl ExecutionResult {
    /// A successful result carrying the post-execution snapshot.
    pub fn success(state: McuState) -> Self {
        Self {
            success: true,
            output: SUCCESS_OUTPUT.to_string(),
            error: None,
            state: Some(state),
        }
    }

    /// A failed result describing `error`.
    pub fn failure(error: &ScriptError) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.to_string()),
            state: None,
        }
    }

    /// Serializes the result to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
