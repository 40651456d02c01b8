// imports
use crate::error::{CoocError, Result};
use fnv::FnvHashMap;
use std::collections::hash_map;


/// A `(row, col)` cell packed into one `u64`: row in the high half, column
/// in the low half. Ordering by key is row-major ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(u64);

impl CellKey {

    pub fn new(row: usize, col: usize) -> Result<CellKey> {
        Ok(CellKey::pack(narrow(row)?, narrow(col)?))
    }

    pub fn pack(row: u32, col: u32) -> CellKey {
        CellKey(((row as u64) << 32) | col as u64)
    }

    pub fn row(self) -> usize {
        (self.0 >> 32) as usize
    }

    pub fn col(self) -> usize {
        (self.0 & 0xFFFF_FFFF) as usize
    }

    /// Same row, column replaced.
    pub fn with_col(self, col: u32) -> CellKey {
        CellKey((self.0 & !0xFFFF_FFFF) | col as u64)
    }
}

/// Index as stored in a cell key.
pub fn narrow(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| CoocError::IndexOverflow(index))
}

/// Checks that every index of a vocabulary of `len` entries fits a cell key.
pub fn check_indexable(len: usize) -> Result<()> {
    match len {
        0 => Ok(()),
        n => narrow(n - 1).map(|_| ()).map_err(|_| CoocError::IndexOverflow(len)),
    }
}


/// Sparse `(row, col) -> count` tally. Used both for a worker's partial
/// table and for the reducer's global accumulator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountTable {
    cells: FnvHashMap<CellKey, u64>,
    total: u64,
}

impl CountTable {

    pub fn new() -> Self {
        Self::default()
    }

    /// One more observed (focus, context) pair.
    pub fn increment(&mut self, key: CellKey) {
        self.add(key, 1);
    }

    /// Adds to an existing cell, never overwrites it.
    pub fn add(&mut self, key: CellKey, count: u64) {
        if count == 0 {
            return
        }
        *self.cells.entry(key).or_insert(0) += count;
        self.total += count;
    }

    /// Adds every cell of `other` into `self`. Commutative and associative.
    pub fn merge(&mut self, other: CountTable) {
        // fold the smaller table into the larger one
        let (mut acc, other) = if self.cells.len() >= other.cells.len() {
            (std::mem::take(self), other)
        } else {
            (other, std::mem::take(self))
        };
        for (key, count) in other.cells {
            acc.add(key, count);
        }
        *self = acc;
    }

    pub fn get(&self, row: usize, col: usize) -> u64 {
        match CellKey::new(row, col) {
            Ok(key) => self.cells.get(&key).copied().unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Sum of all cells, i.e. the number of pairs tallied.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct non-zero cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellKey, u64)> + '_ {
        self.cells.iter().map(|(key, count)| (*key, *count))
    }

    /// Recomputes the total from the cells, independent of the running sum.
    pub fn recount(&self) -> u64 {
        self.cells.values().sum()
    }
}

impl IntoIterator for CountTable {
    type Item = (CellKey, u64);
    type IntoIter = hash_map::IntoIter<CellKey, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}
