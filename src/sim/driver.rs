//! Trace Driver.
//!
//! Replays a command trace through a rank one cycle at a time. Every command
//! of a cycle is delivered before the rank is ticked, so deadline updates made
//! by same-cycle commands are visible to that cycle's pipeline step. Read
//! responses are handed to a [`CompletionSink`] standing in for the memory
//! controller.

use log::{info, warn};

use crate::common::{BusPacket, SimError};
use crate::dram::{CompletionSink, Rank};
use crate::sim::loader::{TraceEntry, TraceOp};

/// Completion sink that records every response with its delivery cycle.
#[derive(Debug, Default)]
pub struct ResponseLog {
    pub responses: Vec<(u64, BusPacket)>,
}

impl ResponseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl CompletionSink for ResponseLog {
    fn receive_from_bus(&mut self, packet: BusPacket, cycle: u64) {
        self.responses.push((cycle, packet));
    }
}

/// Applies a single trace operation to `rank`.
pub fn apply(rank: &mut Rank, op: &TraceOp) -> Result<(), SimError> {
    match op {
        TraceOp::Packet(packet) => rank.receive(packet.clone())?,
        TraceOp::PowerDown => rank.power_down()?,
        TraceOp::PowerUp => rank.power_up()?,
    }
    Ok(())
}

/// Runs `trace` to completion.
///
/// After the last command the rank keeps ticking until every queued read has
/// left the data bus. A write still waiting for its data burst at that point
/// fails the run.
///
/// # Returns
///
/// The cycle at which the run finished.
pub fn run(
    rank: &mut Rank,
    trace: &[TraceEntry],
    sink: &mut dyn CompletionSink,
    max_cycles: u64,
) -> Result<u64, SimError> {
    let mut next = 0;

    loop {
        let now = rank.current_cycle();
        while let Some(entry) = trace.get(next) {
            if entry.cycle > now {
                break;
            }
            apply(rank, &entry.op)?;
            next += 1;
        }

        if next == trace.len() && rank.data_bus().is_idle() {
            break;
        }
        if now >= max_cycles {
            return Err(SimError::CycleLimit(max_cycles));
        }
        rank.update(sink);
    }

    if rank.pending_writes() > 0 {
        warn!(
            "rank {} still expects data for {:?}",
            rank.id(),
            rank.pending_write()
        );
        return Err(SimError::WritesAwaitingData {
            count: rank.pending_writes(),
            cycle: rank.current_cycle(),
        });
    }

    info!(
        "rank {} finished {} trace entries at cycle {}",
        rank.id(),
        trace.len(),
        rank.current_cycle()
    );
    Ok(rank.current_cycle())
}
