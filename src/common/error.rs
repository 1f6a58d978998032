//! Error Types.
//!
//! A [`ProtocolViolation`] means the upstream scheduler issued something the
//! device could not physically accept. It is never retried: whoever drives the
//! rank reports it and stops the simulation. Validation happens before any
//! state is touched, so the rank still describes the cycle of the violation
//! when the error is reported.
//!
//! [`ConfigError`] and [`TraceError`] cover loading the inputs of a run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::common::{BusPacket, CommandKind};
use crate::dram::BankState;

/// Fatal timing or consistency violation detected by a rank.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A bank command arrived in the wrong phase, too early, or for a row
    /// other than the open one.
    #[error("rank {rank} received a {kind} for bank {bank} row {row} when not allowed at cycle {cycle} (bank: {state})")]
    IllegalCommand {
        rank: usize,
        cycle: u64,
        kind: CommandKind,
        bank: usize,
        row: u64,
        state: BankState,
    },

    #[error("rank {rank} received a REF at cycle {cycle} while bank {bank} is not idle (bank: {state})")]
    RefreshWithOpenBank {
        rank: usize,
        cycle: u64,
        bank: usize,
        state: BankState,
    },

    #[error("trying to power down rank {rank} at cycle {cycle} while bank {bank} is not idle (bank: {state})")]
    PowerDownWithOpenBank {
        rank: usize,
        cycle: u64,
        bank: usize,
        state: BankState,
    },

    #[error("trying to power up rank {rank} at cycle {cycle} while it is not powered down")]
    PowerUpWhileActive { rank: usize, cycle: u64 },

    #[error("trying to power up rank {rank} at cycle {cycle} before bank {bank} allows it at cycle {ready_at}")]
    PowerUpTooEarly {
        rank: usize,
        cycle: u64,
        bank: usize,
        ready_at: u64,
    },

    #[error("rank {rank} received {packet} at cycle {cycle} while powered down")]
    CommandWhilePoweredDown {
        rank: usize,
        cycle: u64,
        packet: BusPacket,
    },

    #[error("rank {rank} received {packet} at cycle {cycle} for a bank outside 0..{num_banks}")]
    BankOutOfRange {
        rank: usize,
        cycle: u64,
        packet: BusPacket,
        num_banks: usize,
    },

    /// A row or column beyond the device geometry.
    #[error("rank {rank} received {packet} at cycle {cycle} outside the {num_rows}x{num_cols} array")]
    AddressOutOfRange {
        rank: usize,
        cycle: u64,
        packet: BusPacket,
        num_rows: u64,
        num_cols: u64,
    },

    #[error("rank {rank} received {packet} at cycle {cycle} with no write awaiting data")]
    DataWithoutPendingWrite {
        rank: usize,
        cycle: u64,
        packet: BusPacket,
    },

    #[error("rank {rank} received {packet} at cycle {cycle}, but the oldest write targets b={bank} r={row} c={column}")]
    DataAddressMismatch {
        rank: usize,
        cycle: u64,
        packet: BusPacket,
        bank: usize,
        row: u64,
        column: u64,
    },

    #[error("rank {rank} received {packet} at cycle {cycle} without a payload")]
    DataWithoutPayload {
        rank: usize,
        cycle: u64,
        packet: BusPacket,
    },

    /// A read response, which only ever leaves the rank, was sent back in.
    #[error("rank {rank} received {packet} at cycle {cycle}, but responses only leave the rank")]
    UnexpectedPacket {
        rank: usize,
        cycle: u64,
        packet: BusPacket,
    },
}

impl ProtocolViolation {
    /// Cycle at which the violation was detected.
    pub fn cycle(&self) -> u64 {
        match self {
            ProtocolViolation::IllegalCommand { cycle, .. }
            | ProtocolViolation::RefreshWithOpenBank { cycle, .. }
            | ProtocolViolation::PowerDownWithOpenBank { cycle, .. }
            | ProtocolViolation::PowerUpWhileActive { cycle, .. }
            | ProtocolViolation::PowerUpTooEarly { cycle, .. }
            | ProtocolViolation::CommandWhilePoweredDown { cycle, .. }
            | ProtocolViolation::BankOutOfRange { cycle, .. }
            | ProtocolViolation::AddressOutOfRange { cycle, .. }
            | ProtocolViolation::DataWithoutPendingWrite { cycle, .. }
            | ProtocolViolation::DataAddressMismatch { cycle, .. }
            | ProtocolViolation::DataWithoutPayload { cycle, .. }
            | ProtocolViolation::UnexpectedPacket { cycle, .. } => *cycle,
        }
    }
}

/// Failure to load or validate a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}

/// Failure to read a command trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("trace line {line}: {reason}")]
    Syntax { line: usize, reason: String },
}

/// Failure of a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Violation(#[from] ProtocolViolation),

    #[error("simulation did not finish within {0} cycles")]
    CycleLimit(u64),

    #[error("trace ended at cycle {cycle} with {count} write(s) still awaiting data")]
    WritesAwaitingData { count: usize, cycle: u64 },
}
