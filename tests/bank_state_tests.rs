//! Integration tests for per-bank timing state transitions.

use dram_rank::common::CommandKind;
use dram_rank::config::Timing;
use dram_rank::dram::{BankPhase, BankState};
use rstest::rstest;

/// Creates the default test timing (DDR3-1333).
fn timing() -> Timing {
    Timing::ddr3_1333()
}

/// Tests that a new bank is idle and accepts an activate immediately.
#[test]
fn test_new_bank_idle() {
    let bank = BankState::new();
    assert_eq!(bank.phase(), BankPhase::Idle);
    assert_eq!(bank.open_row(), None);
    assert_eq!(bank.deadlines(), [0; 5]);
    assert!(bank.allows(CommandKind::Activate, 0, 0));
}

/// Tests the deadlines set by an activate.
#[test]
fn test_activate_sets_deadlines() {
    let t = timing();
    let mut bank = BankState::new();
    bank.activate(5, 100, &t);

    assert_eq!(bank.phase(), BankPhase::RowActive);
    assert_eq!(bank.open_row(), Some(5));
    assert_eq!(bank.earliest_activate(), 100 + t.t_rc);
    assert_eq!(bank.earliest_read(), 100 + t.t_rcd - t.al);
    assert_eq!(bank.earliest_write(), 100 + t.t_rcd - t.al);
    assert_eq!(bank.earliest_precharge(), 100 + t.t_ras);
}

/// Tests command legality against phase, deadline, and open row.
#[test]
fn test_allows_checks_phase_deadline_and_row() {
    let t = timing();
    let mut bank = BankState::new();
    bank.activate(5, 0, &t);

    assert!(!bank.allows(CommandKind::Read, 5, 9));
    assert!(bank.allows(CommandKind::Read, 5, 10));
    assert!(!bank.allows(CommandKind::Read, 6, 10));
    assert!(bank.allows(CommandKind::WriteAutoPrecharge, 5, 10));
    assert!(!bank.allows(CommandKind::Write, 4, 50));
    assert!(!bank.allows(CommandKind::Activate, 5, 100));
    assert!(!bank.allows(CommandKind::Precharge, 0, 23));
    assert!(bank.allows(CommandKind::Precharge, 0, 24));
}

/// Tests that rank-wide packets are never validated by a bank.
#[rstest]
#[case(CommandKind::Refresh)]
#[case(CommandKind::Data)]
#[case(CommandKind::Response)]
fn test_rank_wide_kinds_not_bank_commands(#[case] kind: CommandKind) {
    let bank = BankState::new();
    assert!(!bank.allows(kind, 0, 1_000));
}

/// Tests that column commands are rejected on an idle bank.
#[rstest]
#[case(CommandKind::Read)]
#[case(CommandKind::ReadAutoPrecharge)]
#[case(CommandKind::Write)]
#[case(CommandKind::WriteAutoPrecharge)]
#[case(CommandKind::Precharge)]
fn test_idle_bank_rejects_row_commands(#[case] kind: CommandKind) {
    let bank = BankState::new();
    assert!(!bank.allows(kind, 0, 1_000));
}

/// Tests that a read only ever pushes the precharge deadline forward.
#[test]
fn test_read_extends_precharge_by_max() {
    let t = timing();
    let mut bank = BankState::new();
    bank.activate(1, 0, &t);

    bank.read(10, &t);
    assert_eq!(bank.earliest_precharge(), t.t_ras);

    bank.read(20, &t);
    assert_eq!(bank.earliest_precharge(), 20 + t.read_to_pre);
    assert_eq!(bank.phase(), BankPhase::RowActive);
}

/// Tests that a write holds precharge off for the write recovery time.
#[test]
fn test_write_extends_precharge_by_write_recovery() {
    let t = timing();
    let mut bank = BankState::new();
    bank.activate(1, 0, &t);

    bank.write(10, &t);
    assert_eq!(bank.earliest_precharge(), 10 + t.write_to_pre);
    assert!(!bank.allows(CommandKind::Precharge, 0, 10 + t.write_to_pre - 1));
    assert!(bank.allows(CommandKind::Precharge, 0, 10 + t.write_to_pre));

    // A later read with a shorter recovery does not pull it back in.
    bank.read(11, &t);
    assert_eq!(bank.earliest_precharge(), 10 + t.write_to_pre);
    assert_eq!(bank.phase(), BankPhase::RowActive);
}

/// Tests that read with auto-precharge closes the bank.
#[test]
fn test_read_auto_precharge_closes_bank() {
    let t = timing();
    let mut bank = BankState::new();
    bank.activate(1, 0, &t);
    bank.read_auto_precharge(30, &t);

    assert_eq!(bank.phase(), BankPhase::Idle);
    assert_eq!(bank.open_row(), None);
    assert_eq!(bank.earliest_activate(), 30 + t.read_autopre);
}

/// Tests that write with auto-precharge closes the bank.
#[test]
fn test_write_auto_precharge_closes_bank() {
    let t = timing();
    let mut bank = BankState::new();
    bank.activate(1, 0, &t);
    bank.write_auto_precharge(10, &t);

    assert_eq!(bank.phase(), BankPhase::Idle);
    assert_eq!(bank.earliest_activate(), 10 + t.write_autopre);
}

/// Tests the rank-wide column-to-column and turnaround updates.
#[test]
fn test_cross_bank_column_updates() {
    let t = timing();
    let mut bank = BankState::new();

    bank.read_issued_in_rank(50, &t);
    assert_eq!(bank.earliest_read(), 50 + t.column_to_column());
    assert_eq!(bank.earliest_write(), 50 + t.read_to_write);

    bank.write_issued_in_rank(51, &t);
    assert_eq!(bank.earliest_read(), 51 + t.write_to_read);
    assert_eq!(bank.earliest_write(), 50 + t.read_to_write);
}

/// Tests the precharge transition.
#[test]
fn test_precharge() {
    let t = timing();
    let mut bank = BankState::new();
    bank.activate(1, 0, &t);
    bank.precharge(30, &t);

    assert_eq!(bank.phase(), BankPhase::Idle);
    assert_eq!(bank.earliest_activate(), 30 + t.t_rp);
}

/// Tests that refresh overwrites the activate deadline instead of taking the
/// maximum.
#[test]
fn test_refresh_overwrites_activate_deadline() {
    let t = Timing {
        t_rfc: 2,
        ..timing()
    };
    let mut bank = BankState::new();
    bank.activate(1, 100, &t);
    bank.precharge(124, &t);
    assert_eq!(bank.earliest_activate(), 134);

    bank.refresh(130, &t);
    assert_eq!(bank.earliest_activate(), 132);
}

/// Tests power-down entry and exit.
#[test]
fn test_power_down_and_up() {
    let t = timing();
    let mut bank = BankState::new();

    bank.power_down(10, &t);
    assert_eq!(bank.phase(), BankPhase::PoweredDown);
    assert_eq!(bank.earliest_power_up(), 10 + t.t_cke);
    assert!(!bank.allows(CommandKind::Activate, 0, 100));

    bank.power_up(20, &t);
    assert_eq!(bank.phase(), BankPhase::Idle);
    assert_eq!(bank.earliest_activate(), 20 + t.t_xp);
}

/// Tests that power-up never pulls an outstanding refresh deadline back.
#[test]
fn test_power_up_keeps_later_activate_deadline() {
    let t = timing();
    let mut bank = BankState::new();
    bank.refresh(0, &t);
    bank.power_down(1, &t);
    bank.power_up(5, &t);
    assert_eq!(bank.earliest_activate(), t.t_rfc);
}
