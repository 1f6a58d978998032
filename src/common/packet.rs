//! Bus Packets.
//!
//! This module defines the commands and data transfers exchanged between a
//! memory controller and a DRAM rank over the command/address and data buses.
//! The rank never constructs command packets itself; it validates and consumes
//! packets produced upstream and turns read commands into data responses.

use std::fmt;

/// Data carried by a single burst on the data bus.
pub type Payload = Vec<u8>;

/// Closed set of packet kinds a rank can see on its buses.
///
/// Power-down entry and exit are not bus packets; they are driven through
/// `Rank::power_down` and `Rank::power_up`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Open a row in an idle bank.
    Activate,
    /// Column read from the open row.
    Read,
    /// Column read followed by an implicit precharge.
    ReadAutoPrecharge,
    /// Column write to the open row.
    Write,
    /// Column write followed by an implicit precharge.
    WriteAutoPrecharge,
    /// Close the open row of a bank.
    Precharge,
    /// Refresh every bank of the rank.
    Refresh,
    /// Write data burst sent by the controller after a write command.
    Data,
    /// Read data returned by the rank over the data bus.
    ///
    /// Only the rank produces responses; one fed back into the rank is
    /// rejected.
    Response,
}

impl CommandKind {
    /// Every kind, in trace-mnemonic order.
    pub const ALL: [CommandKind; 9] = [
        CommandKind::Activate,
        CommandKind::Read,
        CommandKind::ReadAutoPrecharge,
        CommandKind::Write,
        CommandKind::WriteAutoPrecharge,
        CommandKind::Precharge,
        CommandKind::Refresh,
        CommandKind::Data,
        CommandKind::Response,
    ];

    /// Short mnemonic used in traces and log output.
    pub fn mnemonic(self) -> &'static str {
        match self {
            CommandKind::Activate => "ACT",
            CommandKind::Read => "RD",
            CommandKind::ReadAutoPrecharge => "RDA",
            CommandKind::Write => "WR",
            CommandKind::WriteAutoPrecharge => "WRA",
            CommandKind::Precharge => "PRE",
            CommandKind::Refresh => "REF",
            CommandKind::Data => "DATA",
            CommandKind::Response => "RESP",
        }
    }

    /// Parses a trace mnemonic (case-insensitive).
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        let upper = s.to_ascii_uppercase();
        Self::ALL.into_iter().find(|k| k.mnemonic() == upper)
    }

    /// Returns `true` for the column read commands.
    pub fn is_read(self) -> bool {
        matches!(self, CommandKind::Read | CommandKind::ReadAutoPrecharge)
    }

    /// Returns `true` for the column write commands.
    pub fn is_write(self) -> bool {
        matches!(self, CommandKind::Write | CommandKind::WriteAutoPrecharge)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A single packet on the rank's buses.
///
/// Fields that a kind does not use (the row of a refresh, the payload of an
/// activate) are ignored by the rank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusPacket {
    /// What the packet asks the rank to do.
    pub kind: CommandKind,
    /// Target bank index within the rank.
    pub bank: usize,
    /// Target row address.
    pub row: u64,
    /// Target column address.
    pub column: u64,
    /// Burst data for `Data` and `Response` packets.
    pub data: Option<Payload>,
}

impl BusPacket {
    /// Creates a packet without payload.
    pub fn new(kind: CommandKind, bank: usize, row: u64, column: u64) -> Self {
        Self {
            kind,
            bank,
            row,
            column,
            data: None,
        }
    }

    pub fn activate(bank: usize, row: u64) -> Self {
        Self::new(CommandKind::Activate, bank, row, 0)
    }

    pub fn read(bank: usize, row: u64, column: u64) -> Self {
        Self::new(CommandKind::Read, bank, row, column)
    }

    pub fn read_auto_precharge(bank: usize, row: u64, column: u64) -> Self {
        Self::new(CommandKind::ReadAutoPrecharge, bank, row, column)
    }

    pub fn write(bank: usize, row: u64, column: u64) -> Self {
        Self::new(CommandKind::Write, bank, row, column)
    }

    pub fn write_auto_precharge(bank: usize, row: u64, column: u64) -> Self {
        Self::new(CommandKind::WriteAutoPrecharge, bank, row, column)
    }

    pub fn precharge(bank: usize) -> Self {
        Self::new(CommandKind::Precharge, bank, 0, 0)
    }

    pub fn refresh() -> Self {
        Self::new(CommandKind::Refresh, 0, 0, 0)
    }

    /// Creates a data burst destined for (bank, row, column).
    pub fn data(bank: usize, row: u64, column: u64, payload: Payload) -> Self {
        Self {
            kind: CommandKind::Data,
            bank,
            row,
            column,
            data: Some(payload),
        }
    }
}

impl fmt::Display for BusPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<4} b={} r={} c={}",
            self.kind, self.bank, self.row, self.column
        )?;
        if let Some(data) = &self.data {
            write!(f, " data={} bytes", data.len())?;
        }
        Ok(())
    }
}
