//! Per-feature posting lists guarded by independent locks.

use std::sync::{RwLock, RwLockReadGuard};

/// A single weighted posting: one object's weight for one feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    /// Object id.
    pub id: u32,
    /// The object's weight for the feature owning this list.
    pub weight: f32,
}

/// Per-feature growable posting lists, one lock per feature.
///
/// Appends take the owning feature's write lock for the duration of a
/// single push, so objects touching disjoint feature sets never contend
/// and same-feature appends serialize only on that feature's list.
/// Queries hold read locks; any number of concurrent readers can scan
/// the same list.
#[derive(Debug)]
pub struct PostingStore<P> {
    rows: Vec<RwLock<Vec<P>>>,
}

impl<P: Copy> PostingStore<P> {
    /// Creates a store with one empty posting list per feature.
    pub(crate) fn with_rows(num_rows: usize) -> Self {
        Self {
            rows: (0..num_rows).map(|_| RwLock::new(Vec::new())).collect(),
        }
    }

    /// Returns the number of posting lists (the feature universe size).
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Appends a posting to a feature's list.
    ///
    /// The feature id must be in range; index types validate before
    /// calling.
    pub(crate) fn append(&self, feature: u32, posting: P) {
        self.rows[feature as usize].write().unwrap().push(posting);
    }

    /// Acquires a read guard over a feature's posting list.
    pub(crate) fn read(&self, feature: u32) -> RwLockReadGuard<'_, Vec<P>> {
        self.rows[feature as usize].read().unwrap()
    }

    /// Returns the length of a feature's posting list.
    ///
    /// Out-of-range feature ids report 0, matching the contract that an
    /// absent list is an empty list.
    pub fn row_len(&self, feature: u32) -> usize {
        match self.rows.get(feature as usize) {
            Some(row) => row.read().unwrap().len(),
            None => 0,
        }
    }

    /// Total number of postings across all lists.
    pub fn total_postings(&self) -> usize {
        self.rows.iter().map(|row| row.read().unwrap().len()).sum()
    }
}
