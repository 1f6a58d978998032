//! Per-Bank Timing State.
//!
//! Each bank of a rank tracks its activation phase, the row latched in its
//! row buffer, and the earliest cycle at which every command type becomes
//! legal again. Deadlines only ever move forward: every update takes the
//! maximum of the current and the proposed value. Refresh is the one
//! exception, it overwrites the activate deadline outright.

use std::fmt;

use serde::Serialize;

use crate::common::CommandKind;
use crate::config::Timing;

/// Activation phase of a bank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum BankPhase {
    /// Precharged, no row open.
    #[default]
    Idle,
    /// A row is latched in the row buffer.
    RowActive,
    /// The rank is in power-down; the bank accepts no commands.
    PoweredDown,
}

impl fmt::Display for BankPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BankPhase::Idle => "Idle",
            BankPhase::RowActive => "RowActive",
            BankPhase::PoweredDown => "PowerDown",
        };
        f.write_str(s)
    }
}

/// Timing state of a single bank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BankState {
    phase: BankPhase,
    open_row: u64,
    earliest_activate: u64,
    earliest_read: u64,
    earliest_write: u64,
    earliest_precharge: u64,
    earliest_power_up: u64,
}

fn advance(deadline: &mut u64, proposed: u64) {
    *deadline = (*deadline).max(proposed);
}

impl BankState {
    /// Creates an idle bank with every command immediately legal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current activation phase.
    pub fn phase(&self) -> BankPhase {
        self.phase
    }

    /// The latched row, or `None` unless the bank is `RowActive`.
    pub fn open_row(&self) -> Option<u64> {
        match self.phase {
            BankPhase::RowActive => Some(self.open_row),
            _ => None,
        }
    }

    /// First cycle an ACTIVATE may issue.
    pub fn earliest_activate(&self) -> u64 {
        self.earliest_activate
    }

    /// First cycle a column read may issue.
    pub fn earliest_read(&self) -> u64 {
        self.earliest_read
    }

    /// First cycle a column write may issue.
    pub fn earliest_write(&self) -> u64 {
        self.earliest_write
    }

    /// First cycle a PRECHARGE may issue.
    pub fn earliest_precharge(&self) -> u64 {
        self.earliest_precharge
    }

    /// First cycle the rank may leave power-down.
    pub fn earliest_power_up(&self) -> u64 {
        self.earliest_power_up
    }

    /// Returns the five deadlines in the order activate, read, write,
    /// precharge, power-up.
    pub fn deadlines(&self) -> [u64; 5] {
        [
            self.earliest_activate,
            self.earliest_read,
            self.earliest_write,
            self.earliest_precharge,
            self.earliest_power_up,
        ]
    }

    /// Returns `true` when the bank is precharged and powered up.
    pub fn is_idle(&self) -> bool {
        self.phase == BankPhase::Idle
    }

    /// Checks whether a bank-addressed command may issue at cycle `now`.
    ///
    /// Column commands additionally require `row` to be the open row.
    /// Rank-wide packets (refresh, data) are never legal here; the rank
    /// validates those itself.
    pub fn allows(&self, kind: CommandKind, row: u64, now: u64) -> bool {
        match kind {
            CommandKind::Activate => self.phase == BankPhase::Idle && now >= self.earliest_activate,
            CommandKind::Read | CommandKind::ReadAutoPrecharge => {
                self.open_row() == Some(row) && now >= self.earliest_read
            }
            CommandKind::Write | CommandKind::WriteAutoPrecharge => {
                self.open_row() == Some(row) && now >= self.earliest_write
            }
            CommandKind::Precharge => {
                self.phase == BankPhase::RowActive && now >= self.earliest_precharge
            }
            CommandKind::Refresh | CommandKind::Data | CommandKind::Response => false,
        }
    }

    /// Opens `row` at cycle `now`.
    pub fn activate(&mut self, row: u64, now: u64, t: &Timing) {
        self.phase = BankPhase::RowActive;
        self.open_row = row;
        advance(&mut self.earliest_activate, now + t.t_rc);
        // Posted-CAS: with AL > 0 the column command may be sent AL cycles
        // early and is held inside the device.
        let column_ready = now + t.activate_to_column();
        advance(&mut self.earliest_read, column_ready);
        advance(&mut self.earliest_write, column_ready);
        advance(&mut self.earliest_precharge, now + t.t_ras);
    }

    /// Another bank of the same rank was activated at `now`.
    pub fn activate_elsewhere(&mut self, now: u64, t: &Timing) {
        advance(&mut self.earliest_activate, now + t.t_rrd);
    }

    /// Column read on this bank; the row stays open.
    pub fn read(&mut self, now: u64, t: &Timing) {
        advance(&mut self.earliest_precharge, now + t.read_to_pre);
    }

    /// Column read with auto-precharge; the bank closes.
    pub fn read_auto_precharge(&mut self, now: u64, t: &Timing) {
        self.phase = BankPhase::Idle;
        advance(&mut self.earliest_activate, now + t.read_autopre);
    }

    /// Column write on this bank; the row stays open.
    pub fn write(&mut self, now: u64, t: &Timing) {
        advance(&mut self.earliest_precharge, now + t.write_to_pre);
    }

    /// Column write with auto-precharge; the bank closes.
    pub fn write_auto_precharge(&mut self, now: u64, t: &Timing) {
        self.phase = BankPhase::Idle;
        advance(&mut self.earliest_activate, now + t.write_autopre);
    }

    /// A read was issued somewhere in the rank (including this bank).
    pub fn read_issued_in_rank(&mut self, now: u64, t: &Timing) {
        advance(&mut self.earliest_read, now + t.column_to_column());
        advance(&mut self.earliest_write, now + t.read_to_write);
    }

    /// A write was issued somewhere in the rank (including this bank).
    pub fn write_issued_in_rank(&mut self, now: u64, t: &Timing) {
        advance(&mut self.earliest_read, now + t.write_to_read);
        advance(&mut self.earliest_write, now + t.column_to_column());
    }

    /// Closes the open row at `now`.
    ///
    /// # Arguments
    ///
    /// * `now` - Cycle the PRECHARGE issues.
    /// * `t` - Rank timing; the bank may be activated again after tRP.
    pub fn precharge(&mut self, now: u64, t: &Timing) {
        self.phase = BankPhase::Idle;
        advance(&mut self.earliest_activate, now + t.t_rp);
    }

    /// Starts a refresh; the bank cannot be activated for tRFC cycles.
    pub fn refresh(&mut self, now: u64, t: &Timing) {
        self.earliest_activate = now + t.t_rfc;
    }

    /// Enters power-down; power-up is legal once tCKE has elapsed.
    pub fn power_down(&mut self, now: u64, t: &Timing) {
        self.phase = BankPhase::PoweredDown;
        advance(&mut self.earliest_power_up, now + t.t_cke);
    }

    /// Leaves power-down; the next ACTIVATE waits tXP.
    ///
    /// # Arguments
    ///
    /// * `now` - Cycle the power-up is applied.
    /// * `t` - Rank timing supplying tXP.
    pub fn power_up(&mut self, now: u64, t: &Timing) {
        self.phase = BankPhase::Idle;
        advance(&mut self.earliest_activate, now + t.t_xp);
    }
}

impl fmt::Display for BankState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.phase)?;
        if let Some(row) = self.open_row() {
            write!(f, " row={}", row)?;
        }
        write!(
            f,
            " next: act={} rd={} wr={} pre={} pup={}",
            self.earliest_activate,
            self.earliest_read,
            self.earliest_write,
            self.earliest_precharge,
            self.earliest_power_up
        )
    }
}
