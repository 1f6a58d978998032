//! DRAM Rank Simulator CLI.
//!
//! Replays a command trace through a single rank, checking every command
//! against the device timing, and prints rank statistics at the end.
//!
//! # Usage
//!
//! ```text
//! dram-rank --config configs/ddr3_1333.toml --trace traces/sample.trc [--json]
//! ```
//!
//! A protocol violation stops the run immediately: the violating command, the
//! bank's timing state, and the cycle are reported and the process exits with
//! status 1.

use clap::Parser;
use std::process;

extern crate dram_rank;

use dram_rank::common::SimError;
use dram_rank::config::Config;
use dram_rank::dram::Rank;
use dram_rank::sim::{self, ResponseLog};

/// Command-line arguments for the rank simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Cycle-Accurate DRAM Rank Simulator")]
struct Args {
    #[arg(short, long, default_value = "configs/ddr3_1333.toml")]
    config: String,

    #[arg(short, long)]
    trace: String,

    /// Rank index reported in logs and errors.
    #[arg(long, default_value_t = 0)]
    rank_id: usize,

    /// Print statistics as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

/// Main entry point for the rank simulator.
///
/// # Behavior
///
/// 1. **Configuration**: Parses arguments and loads the TOML configuration.
/// 2. **Trace**: Loads the command trace.
/// 3. **Simulation Loop**: Delivers each cycle's commands, then ticks the rank,
///    until the trace is exhausted and the data bus has drained.
/// 4. **Teardown**: Prints statistics, or the violation and exits with 1.
fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = Config::from_file(&args.config).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });
    let trace = sim::load_trace(&args.trace).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });
    let mut rank = Rank::from_config(&config).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });
    rank.set_id(args.rank_id);

    if !args.json {
        let t = rank.timing();
        println!("Rank Configuration");
        println!("--------------------");
        println!("Device:");
        println!("  Banks:              {}", config.device.num_banks);
        println!("  Rows:               {}", config.device.num_rows);
        println!("  Columns:            {}", config.device.num_cols);
        println!("  Storage:            {:?}", config.device.storage);
        println!("Timing:");
        println!("  RL / WL / AL:       {} / {} / {}", t.rl, t.wl, t.al);
        println!("  BL:                 {}", t.bl);
        println!("  tRCD / tRAS / tRP:  {} / {} / {}", t.t_rcd, t.t_ras, t.t_rp);
        println!("  tRC / tRRD / tCCD:  {} / {} / {}", t.t_rc, t.t_rrd, t.t_ccd);
        println!("  tRFC / tCKE / tXP:  {} / {} / {}", t.t_rfc, t.t_cke, t.t_xp);
        println!("Trace:");
        println!("  File:               {}", args.trace);
        println!("  Entries:            {}", trace.len());
        println!("--------------------");
    }

    let mut responses = ResponseLog::new();
    match sim::run(&mut rank, &trace, &mut responses, config.general.max_cycles) {
        Ok(cycle) => {
            if args.json {
                match serde_json::to_string_pretty(rank.stats()) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("\n[!] FATAL: {}", e);
                        process::exit(1);
                    }
                }
            } else {
                println!("[*] Trace complete at cycle {}", cycle);
                println!("[*] {} read responses returned", responses.len());
                rank.stats().print();
            }
        }
        Err(SimError::Violation(v)) => {
            eprintln!("\n[!] FATAL PROTOCOL VIOLATION: {}", v);
            rank.stats().print();
            process::exit(1);
        }
        Err(e) => {
            eprintln!("\n[!] FATAL: {}", e);
            rank.stats().print();
            process::exit(1);
        }
    }
}
