//! Simulation statistics collection and reporting.
//!
//! This module tracks activity counters for the simulator. It provides:
//! 1. **Executions:** Programs run and how many of them failed.
//! 2. **Script:** Evaluation steps, periodic callbacks fired and failed.
//! 3. **Peripherals:** Capability calls, change notifications and requested delay time.

use std::fmt::{self, Write};

use serde::Serialize;

/// Simulation statistics structure tracking all activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Number of `execute_code` requests.
    pub executions: u64,
    /// Number of requests that ended in an error.
    pub failed_executions: u64,
    /// Capability calls made by scripts.
    pub capability_calls: u64,
    /// State-change signals raised (delivered or not).
    pub notifications: u64,
    /// Periodic callbacks fired by `tick`.
    pub loop_callbacks: u64,
    /// Ticks whose callbacks returned an error.
    pub loop_failures: u64,
    /// Evaluation steps charged across all invocations.
    pub script_steps: u64,
    /// Sum of the milliseconds passed to `delay`.
    pub delay_requested_ms: u64,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"script"`, `"peripherals"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "script", "peripherals"];

const RULE: &str = "==========================================================";
const SEPARATOR: &str = "----------------------------------------------------------";

impl SimStats {
    /// Fraction of executions that failed, as a percentage.
    pub fn failure_rate(&self) -> f64 {
        if self.executions == 0 {
            0.0
        } else {
            self.failed_executions as f64 / self.executions as f64 * 100.0
        }
    }

    fn write_sections(&self, out: &mut impl Write, sections: &[String]) -> fmt::Result {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        writeln!(out, "\n{RULE}")?;
        writeln!(out, "MICROCONTROLLER SIMULATION STATISTICS")?;
        writeln!(out, "{RULE}")?;
        if want("summary") {
            writeln!(out, "executions               {}", self.executions)?;
            writeln!(
                out,
                "executions.failed        {} ({:.2}%)",
                self.failed_executions,
                self.failure_rate()
            )?;
            writeln!(out, "{SEPARATOR}")?;
        }
        if want("script") {
            writeln!(out, "SCRIPT")?;
            writeln!(out, "  steps                  {}", self.script_steps)?;
            writeln!(out, "  loop.callbacks         {}", self.loop_callbacks)?;
            writeln!(out, "  loop.failures          {}", self.loop_failures)?;
            writeln!(out, "{SEPARATOR}")?;
        }
        if want("peripherals") {
            writeln!(out, "PERIPHERALS")?;
            writeln!(out, "  capability.calls       {}", self.capability_calls)?;
            writeln!(out, "  notifications          {}", self.notifications)?;
            writeln!(out, "  delay.requested        {} ms", self.delay_requested_ms)?;
        }
        writeln!(out, "{RULE}")
    }

    /// Renders the requested sections as text.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]; unknown
    /// names are ignored. Pass an empty slice to render every section.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_sections(&mut out, sections);
        out
    }

    /// Prints only the requested statistics sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.render_sections(sections));
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_sections(f, &[])
    }
}
