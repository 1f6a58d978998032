//! DRAM Rank Timing Simulator Library.
//!
//! This crate implements a cycle-accurate timing model of a single DRAM rank:
//! a set of independently banked arrays sharing command/address and data
//! buses. The rank accepts memory-protocol commands, enforces the timing
//! constraints real DRAM imposes on command ordering, and models the pipeline
//! latency between a read command and its data leaving the shared data bus.
//!
//! # Architecture
//!
//! * **Bank state**: per-bank activation phase and the earliest legal cycle of
//!   every command type.
//! * **Rank**: command validation, cross-bank deadline updates, the
//!   read-return schedule, the data bus, and power-down sequencing.
//! * **Harness**: TOML configuration, command traces, and a cycle driver.
//!
//! # Modules
//!
//! * `common`: Bus packets and error types.
//! * `config`: Configuration loading and derived timing.
//! * `dram`: Bank state, bank storage, data bus, and the rank.
//! * `sim`: Trace loading and the simulation loop.
//! * `stats`: Rank statistics collection.

/// Bus packets, command kinds, and error types.
///
/// Provides the packet representation exchanged with the memory controller
/// and the fatal protocol-violation error raised by the rank.
pub mod common;

/// Configuration system for device geometry and DRAM timing.
///
/// Loads TOML configuration files and derives the composite
/// command-to-command delays the rank enforces.
pub mod config;

/// DRAM device model.
///
/// Implements the bank timing state machine, bank storage, the read return
/// path, and the rank that validates commands against them.
pub mod dram;

/// Simulation harness.
///
/// Parses command traces and replays them through a rank cycle by cycle.
pub mod sim;

/// Rank statistics collection and reporting.
pub mod stats;
