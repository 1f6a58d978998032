//! Simulation harness.
//!
//! Loads command traces and drives a rank through them cycle by cycle.

/// Cycle driver and completion sinks.
pub mod driver;

/// Command trace parsing.
pub mod loader;

pub use driver::{run, ResponseLog};
pub use loader::{load_trace, parse_trace, TraceEntry, TraceOp};
