//! Rank statistics collection and reporting.
//!
//! Counts accepted commands, returned responses, data-bus utilisation, and
//! power-down residency for one rank.

use serde::Serialize;

use crate::common::CommandKind;

/// Statistics for a single rank.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RankStats {
    pub cycles: u64,

    pub activates: u64,
    pub reads: u64,
    pub reads_auto_precharge: u64,
    pub writes: u64,
    pub writes_auto_precharge: u64,
    pub precharges: u64,
    pub refreshes: u64,
    pub data_bursts_written: u64,

    pub responses_returned: u64,
    pub data_bus_busy_cycles: u64,

    pub power_downs: u64,
    pub power_ups: u64,
    pub cycles_powered_down: u64,
}

impl RankStats {
    /// Counts one accepted packet.
    pub fn record(&mut self, kind: CommandKind) {
        let counter = match kind {
            CommandKind::Activate => &mut self.activates,
            CommandKind::Read => &mut self.reads,
            CommandKind::ReadAutoPrecharge => &mut self.reads_auto_precharge,
            CommandKind::Write => &mut self.writes,
            CommandKind::WriteAutoPrecharge => &mut self.writes_auto_precharge,
            CommandKind::Precharge => &mut self.precharges,
            CommandKind::Refresh => &mut self.refreshes,
            CommandKind::Data => &mut self.data_bursts_written,
            CommandKind::Response => return,
        };
        *counter += 1;
    }

    /// Total bank and rank commands, excluding data bursts.
    pub fn commands(&self) -> u64 {
        self.activates
            + self.reads
            + self.reads_auto_precharge
            + self.writes
            + self.writes_auto_precharge
            + self.precharges
            + self.refreshes
    }

    /// Fraction of elapsed cycles the data bus carried a read response.
    pub fn bus_utilisation(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.data_bus_busy_cycles as f64 / self.cycles as f64
        }
    }

    /// Prints a formatted summary.
    pub fn print(&self) {
        let cyc = if self.cycles == 0 { 1 } else { self.cycles };

        println!("\n==========================================================");
        println!("DRAM RANK STATISTICS");
        println!("==========================================================");
        println!("sim_cycles               {}", self.cycles);
        println!("commands                 {}", self.commands());
        println!("----------------------------------------------------------");
        println!("COMMAND MIX");
        println!("  cmd.act                {}", self.activates);
        println!("  cmd.rd                 {}", self.reads);
        println!("  cmd.rda                {}", self.reads_auto_precharge);
        println!("  cmd.wr                 {}", self.writes);
        println!("  cmd.wra                {}", self.writes_auto_precharge);
        println!("  cmd.pre                {}", self.precharges);
        println!("  cmd.ref                {}", self.refreshes);
        println!("  data.written           {}", self.data_bursts_written);
        println!("----------------------------------------------------------");
        println!("DATA BUS");
        println!("  responses.returned     {}", self.responses_returned);
        println!(
            "  bus.busy               {} ({:.2}%)",
            self.data_bus_busy_cycles,
            self.bus_utilisation() * 100.0
        );
        println!("----------------------------------------------------------");
        println!("POWER");
        println!("  power.downs            {}", self.power_downs);
        println!("  power.ups              {}", self.power_ups);
        println!(
            "  cycles.powered_down    {} ({:.2}%)",
            self.cycles_powered_down,
            (self.cycles_powered_down as f64 / cyc as f64) * 100.0
        );
        println!("==========================================================");
    }
}
