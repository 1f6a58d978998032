//! Command Trace Loader.
//!
//! Reads plain-text command traces. Each non-empty line holds one command:
//!
//! ```text
//! <cycle> <KIND> [bank [row [column [hex-payload]]]]
//! ```
//!
//! `KIND` is one of `ACT RD RDA WR WRA PRE REF DATA` or the power transitions
//! `PDN` and `PUP`. Missing addresses default to zero. A `DATA` line without a
//! payload is kept as such and rejected by the rank. Text after `#` is a
//! comment. Cycles must not decrease from one line to the next.

use std::fs;
use std::path::Path;

use crate::common::{BusPacket, CommandKind, Payload, TraceError};

/// Operation applied to a rank at a given cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceOp {
    Packet(BusPacket),
    PowerDown,
    PowerUp,
}

/// One trace line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceEntry {
    pub cycle: u64,
    pub op: TraceOp,
}

/// Reads and parses a trace file.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<TraceEntry>, TraceError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trace(&text)
}

/// Parses trace text.
pub fn parse_trace(text: &str) -> Result<Vec<TraceEntry>, TraceError> {
    let mut entries = Vec::new();
    let mut last_cycle = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let entry = parse_line(line).map_err(|reason| TraceError::Syntax {
            line: line_no,
            reason,
        })?;
        if entry.cycle < last_cycle {
            return Err(TraceError::Syntax {
                line: line_no,
                reason: format!("cycle {} is before previous cycle {}", entry.cycle, last_cycle),
            });
        }
        last_cycle = entry.cycle;
        entries.push(entry);
    }

    Ok(entries)
}

fn parse_line(line: &str) -> Result<TraceEntry, String> {
    let mut fields = line.split_whitespace();

    let cycle = parse_number(fields.next(), "cycle")?;
    let mnemonic = fields.next().ok_or("missing command")?;

    let op = match mnemonic.to_ascii_uppercase().as_str() {
        "PDN" => TraceOp::PowerDown,
        "PUP" => TraceOp::PowerUp,
        other => {
            let kind = CommandKind::from_mnemonic(other)
                .filter(|k| *k != CommandKind::Response)
                .ok_or_else(|| format!("unknown command '{}'", mnemonic))?;
            let bank = parse_number(fields.next().or(Some("0")), "bank")? as usize;
            let row = parse_number(fields.next().or(Some("0")), "row")?;
            let column = parse_number(fields.next().or(Some("0")), "column")?;
            let mut packet = BusPacket::new(kind, bank, row, column);
            if kind == CommandKind::Data {
                packet.data = fields.next().map(parse_payload).transpose()?;
            }
            TraceOp::Packet(packet)
        }
    };

    if let Some(extra) = fields.next() {
        return Err(format!("unexpected field '{}'", extra));
    }

    Ok(TraceEntry { cycle, op })
}

fn parse_number(field: Option<&str>, what: &str) -> Result<u64, String> {
    let s = field.ok_or_else(|| format!("missing {}", what))?;
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("invalid {} '{}'", what, s))
}

fn parse_payload(s: &str) -> Result<Payload, String> {
    let hex = s.trim_start_matches("0x");
    if hex.len() % 2 != 0 {
        return Err(format!("payload '{}' has an odd number of digits", s));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|byte| u8::from_str_radix(byte, 16).ok())
                .ok_or_else(|| format!("invalid payload '{}'", s))
        })
        .collect()
}
