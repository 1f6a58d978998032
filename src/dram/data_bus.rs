//! Read Return Path.
//!
//! Read responses leave a rank in two steps. A response first waits in the
//! read-return schedule until its read latency has elapsed, then occupies the
//! shared data bus for BL/2 cycles before it is handed to the controller.
//!
//! The schedule is keyed by the absolute cycle at which each response becomes
//! ready, so advancing a cycle only inspects the head. Responses leave strictly
//! in issue order: a ready response behind a waiting head stays queued, and a
//! ready head waits while the bus is occupied.

use std::collections::VecDeque;

use crate::common::BusPacket;

#[derive(Debug)]
struct PendingResponse {
    packet: BusPacket,
    ready_at: u64,
}

#[derive(Debug)]
struct Outbound {
    packet: BusPacket,
    cycles_left: u64,
}

/// Read-return schedule plus the single outbound data-bus slot.
#[derive(Debug)]
pub struct DataBus {
    queue: VecDeque<PendingResponse>,
    outbound: Option<Outbound>,
    burst_cycles: u64,
}

impl DataBus {
    /// Creates an idle bus whose transfers last `burst_cycles` cycles.
    pub fn new(burst_cycles: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            outbound: None,
            burst_cycles,
        }
    }

    /// Queues a response that may take the bus from cycle `ready_at` on.
    pub fn schedule(&mut self, packet: BusPacket, ready_at: u64) {
        debug_assert!(
            self.queue.back().map_or(true, |p| p.ready_at <= ready_at),
            "responses must become ready in issue order"
        );
        self.queue.push_back(PendingResponse { packet, ready_at });
    }

    /// Advances the bus to cycle `now`.
    ///
    /// First retires the current occupant if its transfer is complete, then
    /// admits the queue head if it is ready and the bus is free.
    ///
    /// # Returns
    ///
    /// The response that left the bus this cycle, if any, and whether a new
    /// response was driven onto the bus.
    pub fn advance(&mut self, now: u64) -> (Option<BusPacket>, bool) {
        let mut departed = None;
        if let Some(out) = self.outbound.as_mut() {
            out.cycles_left = out.cycles_left.saturating_sub(1);
            if out.cycles_left == 0 {
                departed = self.outbound.take().map(|o| o.packet);
            }
        }

        let mut issued = false;
        if self.outbound.is_none() && self.queue.front().is_some_and(|p| p.ready_at <= now) {
            if let Some(head) = self.queue.pop_front() {
                self.outbound = Some(Outbound {
                    packet: head.packet,
                    cycles_left: self.burst_cycles,
                });
                issued = true;
            }
        }

        (departed, issued)
    }

    /// The response currently on the bus.
    pub fn outbound(&self) -> Option<&BusPacket> {
        self.outbound.as_ref().map(|o| &o.packet)
    }

    /// Remaining transfer cycles of the current occupant.
    pub fn outbound_cycles_left(&self) -> Option<u64> {
        self.outbound.as_ref().map(|o| o.cycles_left)
    }

    pub fn is_busy(&self) -> bool {
        self.outbound.is_some()
    }

    /// Responses still waiting for their latency or for the bus.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Cycle at which the queue head becomes ready.
    pub fn next_ready_at(&self) -> Option<u64> {
        self.queue.front().map(|p| p.ready_at)
    }

    /// `true` when nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.outbound.is_none()
    }
}
