//! Common types shared by the rank model and its drivers.
//!
//! This module provides the bus packet representation exchanged with the
//! memory controller and the error types reported by the simulator.

/// Error types for protocol violations and input loading.
pub mod error;

/// Command kinds, bus packets, and data payloads.
pub mod packet;

pub use error::{ConfigError, ProtocolViolation, SimError, TraceError};
pub use packet::{BusPacket, CommandKind, Payload};
