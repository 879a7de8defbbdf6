//! Simulation control.
//!
//! Ties the chip state to the script engine:
//! 1. **Context:** The capability surface a program runs against.
//! 2. **Controller:** Lifecycle, stimulus injection and the host-driven loop.
//! 3. **Notification:** The single state-change subscriber.
//! 4. **Results:** The structured outcome of an execution request.

pub mod context;
pub mod observer;
pub mod result;
pub mod simulator;

pub use context::{CAPABILITIES, ExecutionContext};
pub use observer::{ChangeNotifier, Listener};
pub use result::{ExecutionResult, SUCCESS_OUTPUT};
pub use simulator::{SimStatus, Simulator};
