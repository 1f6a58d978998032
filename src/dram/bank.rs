//! Bank Storage.
//!
//! The storage collaborator a rank delegates column accesses to. Storage has
//! no timing of its own; the rank decides when an access happens and this
//! module only decides what data it sees.

use std::collections::HashMap;

use crate::common::Payload;

/// Backing store for one bank.
pub trait BankStorage {
    /// Returns the burst stored at (row, column).
    fn read(&mut self, row: u64, column: u64) -> Payload;

    /// Stores a burst at (row, column).
    fn write(&mut self, row: u64, column: u64, payload: Payload);
}

/// Sparse storage keyed by (row, column).
///
/// Locations that were never written read back as a zero-filled burst of
/// `burst_bytes` bytes.
#[derive(Debug, Default)]
pub struct SparseBank {
    cells: HashMap<(u64, u64), Payload>,
    burst_bytes: usize,
}

impl SparseBank {
    pub fn new(burst_bytes: usize) -> Self {
        Self {
            cells: HashMap::new(),
            burst_bytes,
        }
    }

    /// Number of distinct locations written so far.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl BankStorage for SparseBank {
    fn read(&mut self, row: u64, column: u64) -> Payload {
        self.cells
            .get(&(row, column))
            .cloned()
            .unwrap_or_else(|| vec![0; self.burst_bytes])
    }

    fn write(&mut self, row: u64, column: u64, payload: Payload) {
        self.cells.insert((row, column), payload);
    }
}

/// Storage that keeps nothing.
///
/// Reads come back as empty bursts, which turns the read command into a
/// completed data response without touching any array.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStorage;

impl BankStorage for NullStorage {
    fn read(&mut self, _row: u64, _column: u64) -> Payload {
        Payload::new()
    }

    fn write(&mut self, _row: u64, _column: u64, _payload: Payload) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_bank_reads_back_writes() {
        let mut bank = SparseBank::new(8);
        assert_eq!(bank.read(1, 2), vec![0; 8]);
        bank.write(1, 2, vec![0xAB; 8]);
        assert_eq!(bank.read(1, 2), vec![0xAB; 8]);
        assert_eq!(bank.read(1, 3), vec![0; 8]);
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn null_storage_drops_everything() {
        let mut bank = NullStorage;
        bank.write(0, 0, vec![1, 2, 3]);
        assert!(bank.read(0, 0).is_empty());
    }
}
