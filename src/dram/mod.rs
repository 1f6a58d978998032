//! DRAM device model.
//!
//! This module contains the per-bank timing state, the bank storage
//! collaborator, the read return path, and the rank that ties them together.

/// Bank storage backends.
pub mod bank;

/// Per-bank activation phase and command deadlines.
pub mod bank_state;

/// Read-return schedule and outbound data-bus slot.
pub mod data_bus;

/// Rank-level command validation and pipeline advancement.
pub mod rank;

pub use bank::{BankStorage, NullStorage, SparseBank};
pub use bank_state::{BankPhase, BankState};
pub use data_bus::DataBus;
pub use rank::{CompletionSink, Rank, WriteTarget};
