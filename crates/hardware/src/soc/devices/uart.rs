//! Universal Asynchronous Receiver-Transmitter (UART) log.
//!
//! The serial port is modelled at the message level: every transmit from the
//! program and every receive injected by the host is recorded as one
//! timestamped [`SerialEntry`]. The log is append-only and unbounded; renderers
//! pick a window with [`SerialLog::recent`].

use serde::Serialize;

/// Transfer direction, from the chip's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Transmitted by the program.
    Tx,
    /// Received from the host.
    Rx,
}

/// One logged transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerialEntry {
    /// Wall-clock time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Transfer direction.
    pub direction: Direction,
    /// Payload text.
    pub data: String,
}

/// Append-only serial log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SerialLog {
    entries: Vec<SerialEntry>,
}

impl SerialLog {
    /// Creates an empty log.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry.
    pub fn push(&mut self, timestamp: u64, direction: Direction, data: impl Into<String>) {
        self.entries.push(SerialEntry {
            timestamp,
            direction,
            data: data.into(),
        });
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[SerialEntry] {
        &self.entries
    }

    /// The last `n` entries (or fewer), oldest first.
    pub fn recent(&self, n: usize) -> &[SerialEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&SerialEntry> {
        self.entries.last()
    }

    /// Number of logged entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
