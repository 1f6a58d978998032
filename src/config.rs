//! Simulator Configuration.
//!
//! Loads the device geometry and DRAM timing parameters from TOML. Raw
//! datasheet parameters (`[timing]`) are turned into the immutable [`Timing`]
//! bundle the rank works with, including the composite command-to-command
//! delays derived from them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;

const DEFAULT_NUM_BANKS: usize = 8;
const DEFAULT_NUM_ROWS: u64 = 16384;
const DEFAULT_NUM_COLS: u64 = 1024;
const DEFAULT_MAX_CYCLES: u64 = 100_000_000;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub timing: TimingParams,
}

impl Config {
    /// Reads and parses a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a TOML document and validates it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.num_banks == 0 {
            return Err(ConfigError::invalid("device.num_banks", "must be non-zero"));
        }
        if self.device.num_rows == 0 {
            return Err(ConfigError::invalid("device.num_rows", "must be non-zero"));
        }
        if self.device.num_cols == 0 {
            return Err(ConfigError::invalid("device.num_cols", "must be non-zero"));
        }
        self.timing.derive().map(|_| ())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Log every packet the rank receives or drives onto the data bus.
    #[serde(default)]
    pub trace_bus: bool,

    /// Hard stop for the trace driver.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_bus: false,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

/// Backing store used for each bank.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// Sparse per-bank storage; written data reads back.
    #[default]
    Sparse,
    /// No storage; reads return empty bursts and writes are dropped.
    None,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default = "default_num_banks")]
    pub num_banks: usize,

    /// Rows per bank; ACTIVATE and column commands must address below this.
    #[serde(default = "default_num_rows")]
    pub num_rows: u64,

    /// Columns per row.
    #[serde(default = "default_num_cols")]
    pub num_cols: u64,

    #[serde(default)]
    pub storage: StorageKind,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            num_banks: DEFAULT_NUM_BANKS,
            num_rows: DEFAULT_NUM_ROWS,
            num_cols: DEFAULT_NUM_COLS,
            storage: StorageKind::default(),
        }
    }
}

fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}

fn default_num_banks() -> usize {
    DEFAULT_NUM_BANKS
}

fn default_num_rows() -> u64 {
    DEFAULT_NUM_ROWS
}

fn default_num_cols() -> u64 {
    DEFAULT_NUM_COLS
}

/// Raw datasheet timing parameters, all in clock cycles.
///
/// Defaults describe a DDR3-1333 part (tCK = 1.5ns).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TimingParams {
    /// CAS latency.
    #[serde(default = "d_cl")]
    pub cl: u64,
    /// Additive latency (posted CAS).
    #[serde(default)]
    pub al: u64,
    /// Burst length in beats; the data bus is busy for BL/2 cycles.
    #[serde(default = "d_bl")]
    pub bl: u64,
    #[serde(default = "d_t_ras")]
    pub t_ras: u64,
    #[serde(default = "d_t_rcd")]
    pub t_rcd: u64,
    #[serde(default = "d_t_rrd")]
    pub t_rrd: u64,
    #[serde(default = "d_t_rc")]
    pub t_rc: u64,
    #[serde(default = "d_t_rp")]
    pub t_rp: u64,
    #[serde(default = "d_t_ccd")]
    pub t_ccd: u64,
    #[serde(default = "d_t_rtp")]
    pub t_rtp: u64,
    #[serde(default = "d_t_wtr")]
    pub t_wtr: u64,
    #[serde(default = "d_t_wr")]
    pub t_wr: u64,
    /// Rank-to-rank switching time.
    #[serde(default = "d_t_rtrs")]
    pub t_rtrs: u64,
    #[serde(default = "d_t_rfc")]
    pub t_rfc: u64,
    #[serde(default = "d_t_cke")]
    pub t_cke: u64,
    #[serde(default = "d_t_xp")]
    pub t_xp: u64,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            cl: d_cl(),
            al: 0,
            bl: d_bl(),
            t_ras: d_t_ras(),
            t_rcd: d_t_rcd(),
            t_rrd: d_t_rrd(),
            t_rc: d_t_rc(),
            t_rp: d_t_rp(),
            t_ccd: d_t_ccd(),
            t_rtp: d_t_rtp(),
            t_wtr: d_t_wtr(),
            t_wr: d_t_wr(),
            t_rtrs: d_t_rtrs(),
            t_rfc: d_t_rfc(),
            t_cke: d_t_cke(),
            t_xp: d_t_xp(),
        }
    }
}

fn d_cl() -> u64 {
    10
}

fn d_bl() -> u64 {
    8
}

fn d_t_ras() -> u64 {
    24
}

fn d_t_rcd() -> u64 {
    10
}

fn d_t_rrd() -> u64 {
    4
}

fn d_t_rc() -> u64 {
    34
}

fn d_t_rp() -> u64 {
    10
}

fn d_t_ccd() -> u64 {
    4
}

fn d_t_rtp() -> u64 {
    5
}

fn d_t_wtr() -> u64 {
    5
}

fn d_t_wr() -> u64 {
    10
}

fn d_t_rtrs() -> u64 {
    1
}

fn d_t_rfc() -> u64 {
    74
}

fn d_t_cke() -> u64 {
    4
}

fn d_t_xp() -> u64 {
    4
}

impl TimingParams {
    /// Validates the parameters and computes the derived delays.
    pub fn derive(&self) -> Result<Timing, ConfigError> {
        if self.bl == 0 || self.bl % 2 != 0 {
            return Err(ConfigError::invalid("timing.bl", "must be a non-zero even number"));
        }
        if self.cl == 0 {
            return Err(ConfigError::invalid("timing.cl", "must be non-zero"));
        }
        if self.al > self.t_rcd {
            return Err(ConfigError::invalid("timing.al", "must not exceed t_rcd"));
        }

        let rl = self.cl + self.al;
        let wl = rl - 1;
        let burst = self.bl / 2;

        Ok(Timing {
            t_rcd: self.t_rcd,
            t_ras: self.t_ras,
            t_rp: self.t_rp,
            t_rc: self.t_rc,
            t_rrd: self.t_rrd,
            t_rfc: self.t_rfc,
            t_cke: self.t_cke,
            t_xp: self.t_xp,
            t_ccd: self.t_ccd,
            al: self.al,
            bl: self.bl,
            rl,
            wl,
            read_to_pre: self.al + burst + self.t_rtp.max(2) - 2,
            read_to_write: rl + burst + self.t_rtrs - wl,
            write_to_pre: wl + burst + self.t_wr,
            write_to_read: wl + burst + self.t_wtr,
            read_autopre: self.al + self.t_rtp + self.t_rp,
            write_autopre: wl + burst + self.t_wr + self.t_rp,
        })
    }
}

/// Immutable timing bundle consumed by a rank.
///
/// Every value is in clock cycles. Built from [`TimingParams::derive`], or
/// field by field when a test needs a specific shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timing {
    /// ACTIVATE to column command.
    pub t_rcd: u64,
    /// ACTIVATE to PRECHARGE, same bank.
    pub t_ras: u64,
    /// PRECHARGE to ACTIVATE, same bank.
    pub t_rp: u64,
    /// ACTIVATE to ACTIVATE, same bank.
    pub t_rc: u64,
    /// ACTIVATE to ACTIVATE, different banks.
    pub t_rrd: u64,
    /// REFRESH to ACTIVATE.
    pub t_rfc: u64,
    /// Minimum power-down residency.
    pub t_cke: u64,
    /// Power-down exit to ACTIVATE.
    pub t_xp: u64,
    /// Column command to column command.
    pub t_ccd: u64,
    /// Additive latency.
    pub al: u64,
    /// Burst length in beats.
    pub bl: u64,
    /// Read latency: command to first data beat on the bus.
    pub rl: u64,
    /// Write latency.
    pub wl: u64,
    /// READ to PRECHARGE, same bank.
    pub read_to_pre: u64,
    /// READ to WRITE, any bank.
    pub read_to_write: u64,
    /// WRITE to PRECHARGE, same bank (write recovery).
    pub write_to_pre: u64,
    /// WRITE to READ, any bank.
    pub write_to_read: u64,
    /// READ with auto-precharge to the next ACTIVATE.
    pub read_autopre: u64,
    /// WRITE with auto-precharge to the next ACTIVATE.
    pub write_autopre: u64,
}

impl Timing {
    /// Timing of the default DDR3-1333 configuration.
    pub fn ddr3_1333() -> Self {
        DEFAULT_DDR3_1333
    }

    /// Cycles a burst occupies the data bus.
    pub fn burst_cycles(&self) -> u64 {
        self.bl / 2
    }

    /// Minimum spacing between column commands.
    pub fn column_to_column(&self) -> u64 {
        self.t_ccd.max(self.burst_cycles())
    }

    /// Activate to column command, shortened by the additive latency.
    pub fn activate_to_column(&self) -> u64 {
        self.t_rcd.saturating_sub(self.al)
    }
}

/// Derived form of `TimingParams::default()`, kept as a constant so that
/// `Timing::ddr3_1333` cannot fail.
const DEFAULT_DDR3_1333: Timing = Timing {
    t_rcd: 10,
    t_ras: 24,
    t_rp: 10,
    t_rc: 34,
    t_rrd: 4,
    t_rfc: 74,
    t_cke: 4,
    t_xp: 4,
    t_ccd: 4,
    al: 0,
    bl: 8,
    rl: 10,
    wl: 9,
    read_to_pre: 7,
    read_to_write: 6,
    write_to_pre: 23,
    write_to_read: 18,
    read_autopre: 15,
    write_autopre: 33,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_ddr3_constant() {
        let derived = TimingParams::default().derive().unwrap();
        assert_eq!(derived, Timing::ddr3_1333());
    }

    #[test]
    fn additive_latency_shifts_read_latency() {
        let params = TimingParams {
            al: 3,
            ..TimingParams::default()
        };
        let t = params.derive().unwrap();
        assert_eq!(t.rl, 13);
        assert_eq!(t.wl, 12);
        assert_eq!(t.activate_to_column(), 7);
        assert_eq!(t.read_autopre, 3 + 5 + 10);
    }

    #[test]
    fn odd_burst_length_rejected() {
        let params = TimingParams {
            bl: 7,
            ..TimingParams::default()
        };
        assert!(params.derive().is_err());
    }
}
