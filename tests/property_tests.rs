//! Property tests over random command streams.

use dram_rank::common::{BusPacket, CommandKind};
use dram_rank::config::Timing;
use dram_rank::dram::{BankState, Rank};
use proptest::prelude::*;

const NUM_BANKS: usize = 4;

/// One step of a random stream: idle cycles, then an attempted operation.
#[derive(Debug, Clone)]
struct Step {
    wait: u64,
    op: u8,
    bank: usize,
    row: u64,
}

fn step() -> impl Strategy<Value = Step> {
    (0u64..40, 0u8..10, 0..NUM_BANKS, 0u64..3).prop_map(|(wait, op, bank, row)| Step {
        wait,
        op,
        bank,
        row,
    })
}

/// Attempts the operation described by `s`; the outcome may be a violation.
fn attempt(rank: &mut Rank, s: &Step) -> bool {
    let result = match s.op {
        0 => rank.receive(BusPacket::activate(s.bank, s.row)),
        1 => rank.receive(BusPacket::read(s.bank, s.row, 0)),
        2 => rank.receive(BusPacket::read_auto_precharge(s.bank, s.row, 0)),
        3 => rank.receive(BusPacket::write(s.bank, s.row, 0)),
        4 => rank.receive(BusPacket::write_auto_precharge(s.bank, s.row, 0)),
        5 => rank.receive(BusPacket::precharge(s.bank)),
        6 => rank.receive(BusPacket::refresh()),
        7 => match rank.pending_write() {
            Some(w) => rank.receive(BusPacket::data(w.bank, w.row, w.column, vec![s.op; 64])),
            None => rank.receive(BusPacket::data(s.bank, s.row, 0, Vec::new())),
        },
        8 => rank.power_down(),
        _ => rank.power_up(),
    };
    result.is_ok()
}

fn assert_not_decreased(before: &[BankState], after: &[BankState]) {
    for (b, (old, new)) in before.iter().zip(after).enumerate() {
        for (old_d, new_d) in old.deadlines().iter().zip(new.deadlines()) {
            assert!(
                new_d >= *old_d,
                "bank {} deadline went backwards: {} -> {}",
                b,
                old,
                new
            );
        }
    }
}

proptest! {
    /// Deadlines never move backwards, and rejected operations change nothing.
    #[test]
    fn deadlines_never_decrease(steps in prop::collection::vec(step(), 1..200)) {
        let mut rank = Rank::new(Timing::ddr3_1333(), NUM_BANKS);

        for s in &steps {
            for _ in 0..s.wait {
                let before = rank.banks().to_vec();
                rank.tick();
                prop_assert_eq!(rank.banks(), before.as_slice());
            }

            let before = rank.banks().to_vec();
            let accepted = attempt(&mut rank, s);
            assert_not_decreased(&before, rank.banks());
            if !accepted {
                prop_assert_eq!(rank.banks(), before.as_slice());
            }
        }
    }

    /// Every accepted read is returned exactly once, in issue order.
    #[test]
    fn every_read_returns_once(steps in prop::collection::vec(step(), 1..150)) {
        let mut rank = Rank::new(Timing::ddr3_1333(), NUM_BANKS);
        let mut issued = Vec::new();
        let mut returned = Vec::new();

        for s in &steps {
            for _ in 0..s.wait {
                if let Some(p) = rank.tick() {
                    returned.push(p.bank);
                }
            }
            let is_read = matches!(s.op, 1 | 2);
            if attempt(&mut rank, s) && is_read {
                issued.push(s.bank);
            }
        }
        while !rank.data_bus().is_idle() {
            if let Some(p) = rank.tick() {
                prop_assert_eq!(p.kind, CommandKind::Response);
                returned.push(p.bank);
            }
        }

        prop_assert_eq!(issued, returned);
    }
}
