//! DRAM Rank.
//!
//! A rank is a set of banks sharing one command/address bus and one data bus.
//! It accepts commands from the memory controller, checks each one against the
//! timing state of its banks, updates the deadlines of every affected bank, and
//! returns read data over the shared data bus after the read latency.
//!
//! Two entry points drive the model each cycle, always in this order:
//!
//! 1. [`Rank::receive`] (and [`Rank::power_down`] / [`Rank::power_up`]) for
//!    every command of the cycle. These validate and update deadlines but never
//!    advance time.
//! 2. [`Rank::tick`], which advances the clock and the return path but never
//!    validates anything.

use std::collections::VecDeque;

use log::{debug, error, warn};

use crate::common::{BusPacket, CommandKind, ConfigError, ProtocolViolation};
use crate::config::{Config, StorageKind, Timing};
use crate::dram::bank::{BankStorage, NullStorage, SparseBank};
use crate::dram::bank_state::BankState;
use crate::dram::data_bus::DataBus;
use crate::stats::RankStats;

/// Width of the data bus in bytes per beat.
const DATA_BUS_BYTES: usize = 8;

/// Receiver of completed read responses (the memory controller side).
pub trait CompletionSink {
    /// Takes ownership of a response that has just left the data bus.
    fn receive_from_bus(&mut self, packet: BusPacket, cycle: u64);
}

/// Destination recorded by a write command for the data burst that follows.
///
/// Targets queue in issue order and a data burst always pairs with the oldest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteTarget {
    /// Bank the write was issued to.
    pub bank: usize,
    /// Open row at the time of the write.
    pub row: u64,
    /// Column the burst lands at.
    pub column: u64,
}

/// Timing model of a single DRAM rank.
pub struct Rank {
    id: usize,
    id_assigned: bool,
    timing: Timing,
    banks: Vec<BankState>,
    num_rows: u64,
    num_cols: u64,
    storage: Vec<Box<dyn BankStorage>>,
    pending_writes: VecDeque<WriteTarget>,
    bus: DataBus,
    powered_down: bool,
    refresh_waiting: bool,
    current_cycle: u64,
    trace_bus: bool,
    stats: RankStats,
}

impl Rank {
    /// Creates a rank with the given per-bank storage.
    ///
    /// The number of banks is the number of storage instances.
    pub fn with_storage(timing: Timing, storage: Vec<Box<dyn BankStorage>>) -> Self {
        Self {
            id: 0,
            id_assigned: false,
            timing,
            banks: vec![BankState::new(); storage.len()],
            num_rows: u64::MAX,
            num_cols: u64::MAX,
            storage,
            pending_writes: VecDeque::new(),
            bus: DataBus::new(timing.burst_cycles()),
            powered_down: false,
            refresh_waiting: false,
            current_cycle: 0,
            trace_bus: cfg!(feature = "always-trace"),
            stats: RankStats::default(),
        }
    }

    /// Creates a rank whose banks keep written data.
    pub fn new(timing: Timing, num_banks: usize) -> Self {
        let burst_bytes = timing.bl as usize * DATA_BUS_BYTES;
        let storage = (0..num_banks)
            .map(|_| Box::new(SparseBank::new(burst_bytes)) as Box<dyn BankStorage>)
            .collect();
        Self::with_storage(timing, storage)
    }

    /// Creates a rank that models timing only.
    pub fn without_storage(timing: Timing, num_banks: usize) -> Self {
        let storage = (0..num_banks)
            .map(|_| Box::new(NullStorage) as Box<dyn BankStorage>)
            .collect();
        Self::with_storage(timing, storage)
    }

    /// Limits the addressable rows and columns of every bank.
    ///
    /// Ranks start with no limit; commands outside the limits are rejected
    /// with [`ProtocolViolation::AddressOutOfRange`].
    ///
    /// # Arguments
    ///
    /// * `num_rows` - Rows per bank.
    /// * `num_cols` - Columns per row.
    pub fn with_geometry(mut self, num_rows: u64, num_cols: u64) -> Self {
        self.num_rows = num_rows;
        self.num_cols = num_cols;
        self
    }

    /// Builds a rank from a loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let timing = config.timing.derive()?;
        let device = &config.device;
        let rank = match device.storage {
            StorageKind::Sparse => Self::new(timing, device.num_banks),
            StorageKind::None => Self::without_storage(timing, device.num_banks),
        };
        let mut rank = rank.with_geometry(device.num_rows, device.num_cols);
        rank.set_trace(config.general.trace_bus);
        Ok(rank)
    }

    /// Assigns the rank index. Only the first call has an effect.
    pub fn set_id(&mut self, id: usize) {
        if self.id_assigned {
            warn!("rank {} already has an id, ignoring {}", self.id, id);
            return;
        }
        self.id = id;
        self.id_assigned = true;
    }

    /// Rank index used in logs and violations.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Enables per-packet bus tracing through the `log` facade.
    pub fn set_trace(&mut self, enabled: bool) {
        self.trace_bus = enabled || cfg!(feature = "always-trace");
    }

    /// Timing bundle the rank enforces.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Cycle the next received command is stamped with.
    pub fn current_cycle(&self) -> u64 {
        self.current_cycle
    }

    /// Number of banks in the rank.
    pub fn num_banks(&self) -> usize {
        self.banks.len()
    }

    /// Timing state of every bank, indexed by bank.
    pub fn banks(&self) -> &[BankState] {
        &self.banks
    }

    /// Timing state of one bank, or `None` if `bank` is out of range.
    pub fn bank_state(&self, bank: usize) -> Option<&BankState> {
        self.banks.get(bank)
    }

    /// Returns `true` between an accepted power-down and power-up.
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Returns `true` while a requested refresh has not been issued.
    pub fn refresh_waiting(&self) -> bool {
        self.refresh_waiting
    }

    /// Marks a refresh as owed; cleared when the next REF is accepted.
    pub fn request_refresh(&mut self) {
        self.refresh_waiting = true;
    }

    /// Oldest write still waiting for its data burst.
    pub fn pending_write(&self) -> Option<WriteTarget> {
        self.pending_writes.front().copied()
    }

    /// Writes still waiting for their data burst.
    pub fn pending_writes(&self) -> usize {
        self.pending_writes.len()
    }

    /// Read responses not yet on the data bus.
    pub fn pending_reads(&self) -> usize {
        self.bus.pending()
    }

    /// Read-return queue and data-bus occupant.
    pub fn data_bus(&self) -> &DataBus {
        &self.bus
    }

    /// `true` once every read has been returned and every write has its data.
    pub fn is_quiescent(&self) -> bool {
        self.bus.is_idle() && self.pending_writes.is_empty()
    }

    /// Counters collected since construction.
    pub fn stats(&self) -> &RankStats {
        &self.stats
    }

    /// Accepts one packet from the command or data bus.
    ///
    /// Reads are turned into responses and queued on the return path;
    /// write commands record where their data will land; data packets are
    /// written to storage. Every other packet is consumed here. A response
    /// sent back in is rejected.
    pub fn receive(&mut self, packet: BusPacket) -> Result<(), ProtocolViolation> {
        if self.trace_bus {
            debug!(" -- R{} Receiving On Bus    : {}", self.id, packet);
        }

        if self.powered_down {
            return Err(self.report(ProtocolViolation::CommandWhilePoweredDown {
                rank: self.id,
                cycle: self.current_cycle,
                packet,
            }));
        }

        let kind = packet.kind;
        match kind {
            CommandKind::Activate => self.activate(packet)?,
            CommandKind::Read | CommandKind::ReadAutoPrecharge => self.column_read(packet)?,
            CommandKind::Write | CommandKind::WriteAutoPrecharge => self.column_write(packet)?,
            CommandKind::Precharge => self.precharge(packet)?,
            CommandKind::Refresh => self.refresh()?,
            CommandKind::Data => self.write_data(packet)?,
            CommandKind::Response => {
                return Err(self.report(ProtocolViolation::UnexpectedPacket {
                    rank: self.id,
                    cycle: self.current_cycle,
                    packet,
                }));
            }
        }
        self.stats.record(kind);
        Ok(())
    }

    fn activate(&mut self, packet: BusPacket) -> Result<(), ProtocolViolation> {
        self.check_bank_command(&packet)?;
        let now = self.current_cycle;
        let t = self.timing;

        for (i, bank) in self.banks.iter_mut().enumerate() {
            if i == packet.bank {
                bank.activate(packet.row, now, &t);
            } else {
                bank.activate_elsewhere(now, &t);
            }
        }
        Ok(())
    }

    fn column_read(&mut self, mut packet: BusPacket) -> Result<(), ProtocolViolation> {
        self.check_bank_command(&packet)?;
        let now = self.current_cycle;
        let t = self.timing;

        let bank = &mut self.banks[packet.bank];
        if packet.kind == CommandKind::ReadAutoPrecharge {
            bank.read_auto_precharge(now, &t);
        } else {
            bank.read(now, &t);
        }
        for bank in &mut self.banks {
            bank.read_issued_in_rank(now, &t);
        }

        let payload = self.storage[packet.bank].read(packet.row, packet.column);
        packet.kind = CommandKind::Response;
        packet.data = Some(payload);
        self.bus.schedule(packet, now + t.rl);
        Ok(())
    }

    fn column_write(&mut self, packet: BusPacket) -> Result<(), ProtocolViolation> {
        self.check_bank_command(&packet)?;
        let now = self.current_cycle;
        let t = self.timing;

        let bank = &mut self.banks[packet.bank];
        if packet.kind == CommandKind::WriteAutoPrecharge {
            bank.write_auto_precharge(now, &t);
        } else {
            bank.write(now, &t);
        }
        for bank in &mut self.banks {
            bank.write_issued_in_rank(now, &t);
        }

        self.pending_writes.push_back(WriteTarget {
            bank: packet.bank,
            row: packet.row,
            column: packet.column,
        });
        Ok(())
    }

    fn precharge(&mut self, packet: BusPacket) -> Result<(), ProtocolViolation> {
        self.check_bank_command(&packet)?;
        let now = self.current_cycle;
        let t = self.timing;
        self.banks[packet.bank].precharge(now, &t);
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), ProtocolViolation> {
        if let Some((bank, state)) = self.first_busy_bank() {
            return Err(self.report(ProtocolViolation::RefreshWithOpenBank {
                rank: self.id,
                cycle: self.current_cycle,
                bank,
                state,
            }));
        }

        let now = self.current_cycle;
        let t = self.timing;
        for bank in &mut self.banks {
            bank.refresh(now, &t);
        }
        self.refresh_waiting = false;
        Ok(())
    }

    fn write_data(&mut self, packet: BusPacket) -> Result<(), ProtocolViolation> {
        let Some(target) = self.pending_writes.front().copied() else {
            return Err(self.report(ProtocolViolation::DataWithoutPendingWrite {
                rank: self.id,
                cycle: self.current_cycle,
                packet,
            }));
        };

        if (packet.bank, packet.row, packet.column) != (target.bank, target.row, target.column) {
            return Err(self.report(ProtocolViolation::DataAddressMismatch {
                rank: self.id,
                cycle: self.current_cycle,
                packet,
                bank: target.bank,
                row: target.row,
                column: target.column,
            }));
        }

        if !matches!(&packet.data, Some(data) if !data.is_empty()) {
            return Err(self.report(ProtocolViolation::DataWithoutPayload {
                rank: self.id,
                cycle: self.current_cycle,
                packet,
            }));
        }

        self.pending_writes.pop_front();
        let payload = packet.data.unwrap_or_default();
        self.storage[target.bank].write(target.row, target.column, payload);
        Ok(())
    }

    /// Powers the rank down. Every bank must be idle.
    pub fn power_down(&mut self) -> Result<(), ProtocolViolation> {
        if let Some((bank, state)) = self.first_busy_bank() {
            return Err(self.report(ProtocolViolation::PowerDownWithOpenBank {
                rank: self.id,
                cycle: self.current_cycle,
                bank,
                state,
            }));
        }

        let now = self.current_cycle;
        let t = self.timing;
        for bank in &mut self.banks {
            bank.power_down(now, &t);
        }
        self.powered_down = true;
        self.stats.power_downs += 1;
        if self.trace_bus {
            debug!(" -- R{} Power Down at cycle {}", self.id, now);
        }
        Ok(())
    }

    /// Brings the rank out of power-down once tCKE has elapsed on every bank.
    pub fn power_up(&mut self) -> Result<(), ProtocolViolation> {
        if !self.powered_down {
            return Err(self.report(ProtocolViolation::PowerUpWhileActive {
                rank: self.id,
                cycle: self.current_cycle,
            }));
        }

        let now = self.current_cycle;
        if let Some((bank, state)) = self
            .banks
            .iter()
            .enumerate()
            .find(|(_, b)| b.earliest_power_up() > now)
        {
            return Err(self.report(ProtocolViolation::PowerUpTooEarly {
                rank: self.id,
                cycle: now,
                bank,
                ready_at: state.earliest_power_up(),
            }));
        }

        let t = self.timing;
        for bank in &mut self.banks {
            bank.power_up(now, &t);
        }
        self.powered_down = false;
        self.stats.power_ups += 1;
        if self.trace_bus {
            debug!(" -- R{} Power Up at cycle {}", self.id, now);
        }
        Ok(())
    }

    /// Advances the rank by one clock cycle.
    ///
    /// # Returns
    ///
    /// The read response that finished its data-bus transfer this cycle.
    /// Ownership passes to the caller, which delivers it to the controller.
    pub fn tick(&mut self) -> Option<BusPacket> {
        self.current_cycle += 1;
        let now = self.current_cycle;

        let (departed, issued) = self.bus.advance(now);
        if departed.is_some() {
            self.stats.responses_returned += 1;
        }
        if issued && self.trace_bus {
            if let Some(packet) = self.bus.outbound() {
                debug!(" -- R{} Issuing On Data Bus : {}", self.id, packet);
            }
        }

        if self.bus.is_busy() {
            self.stats.data_bus_busy_cycles += 1;
        }
        if self.powered_down {
            self.stats.cycles_powered_down += 1;
        }
        self.stats.cycles = now;

        departed
    }

    /// Advances one cycle and hands any departing response to `sink`.
    pub fn update(&mut self, sink: &mut dyn CompletionSink) {
        if let Some(packet) = self.tick() {
            sink.receive_from_bus(packet, self.current_cycle);
        }
    }

    fn check_bank_command(&self, packet: &BusPacket) -> Result<(), ProtocolViolation> {
        let Some(state) = self.banks.get(packet.bank) else {
            return Err(self.report(ProtocolViolation::BankOutOfRange {
                rank: self.id,
                cycle: self.current_cycle,
                packet: packet.clone(),
                num_banks: self.banks.len(),
            }));
        };

        let is_column = packet.kind.is_read() || packet.kind.is_write();
        let uses_row = is_column || packet.kind == CommandKind::Activate;
        let row_out = uses_row && packet.row >= self.num_rows;
        let column_out = is_column && packet.column >= self.num_cols;
        if row_out || column_out {
            return Err(self.report(ProtocolViolation::AddressOutOfRange {
                rank: self.id,
                cycle: self.current_cycle,
                packet: packet.clone(),
                num_rows: self.num_rows,
                num_cols: self.num_cols,
            }));
        }

        if !state.allows(packet.kind, packet.row, self.current_cycle) {
            return Err(self.report(ProtocolViolation::IllegalCommand {
                rank: self.id,
                cycle: self.current_cycle,
                kind: packet.kind,
                bank: packet.bank,
                row: packet.row,
                state: *state,
            }));
        }
        Ok(())
    }

    fn first_busy_bank(&self) -> Option<(usize, BankState)> {
        self.banks
            .iter()
            .enumerate()
            .find(|(_, b)| !b.is_idle())
            .map(|(i, b)| (i, *b))
    }

    fn report(&self, violation: ProtocolViolation) -> ProtocolViolation {
        error!("== Error - {}", violation);
        violation
    }
}
