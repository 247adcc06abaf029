//! Weighted inverted index for cosine search over normalized vectors.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use rayon::prelude::*;

use crate::config::IndexConfig;
use crate::error::{InvfileError, Result};
use crate::index::postings::{Posting, PostingStore};
use crate::index::{stats_for, validate_features, validate_weights, IndexStats};
use crate::query::{build_plan, WeightedScratch};
use crate::vector::SparseVector;

/// An inverted index over sparse vectors with floating point weights.
///
/// Supports only non-negative weights and is optimized for k-NN
/// retrieval under the cosine distance, assuming vectors were
/// normalized before insertion (see [`SparseVector::normalize`]).
///
/// Construction may run from many threads at once: each posting list
/// carries its own lock, so inserts serialize only when they share a
/// feature. Once built, any number of queries may run concurrently as
/// long as no insert races with them; that phase separation is the
/// caller's responsibility.
#[derive(Debug)]
pub struct WeightedIndex {
    store: PostingStore<Posting>,
    sizes: Mutex<HashMap<u32, u32>>,
    config: IndexConfig,
}

impl WeightedIndex {
    /// Creates an empty index sized for the given feature universe.
    pub fn new(num_features: usize) -> Self {
        Self::with_config(IndexConfig::with_num_features(num_features))
    }

    /// Creates an empty index from a configuration.
    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            store: PostingStore::with_rows(config.num_features),
            sizes: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Builds an index from a collection of (object id, vector) pairs,
    /// ingesting them in parallel.
    pub fn build(config: IndexConfig, items: &[(u32, SparseVector)]) -> Result<Self> {
        let index = Self::with_config(config);
        index.insert_batch(items)?;
        Ok(index)
    }

    /// Inserts one object's vector.
    ///
    /// Weights must be finite and non-negative, and feature ids must lie
    /// inside the configured universe; the vector is validated in full
    /// before any posting is appended, so a failed insert leaves the
    /// index unchanged. Entries with weight below the tolerance are
    /// dropped. Each object id may be inserted once
    /// ([`InvfileError::DuplicateObject`] otherwise); postings are
    /// append-only, so a changed vector needs a fresh id.
    pub fn insert(&self, id: u32, vector: &SparseVector) -> Result<()> {
        validate_weights(vector, true)?;
        validate_features(vector, self.config.num_features)?;

        let retained: Vec<(u32, f32)> = vector
            .iter()
            .filter(|&(_, w)| w >= self.config.tolerance)
            .collect();

        {
            let mut sizes = self.sizes.lock().unwrap();
            if sizes.contains_key(&id) {
                return Err(InvfileError::DuplicateObject(id));
            }
            sizes.insert(id, retained.len() as u32);
        }

        for (feature, weight) in retained {
            self.store.append(feature, Posting { id, weight });
        }
        Ok(())
    }

    /// Inserts a batch of objects in parallel.
    ///
    /// Synchronization happens per posting list, never index-wide. Honors
    /// the configured thread count (0 = all cores). Stops at the first
    /// invalid object; objects already ingested remain indexed.
    pub fn insert_batch(&self, items: &[(u32, SparseVector)]) -> Result<()> {
        let insert_all = || {
            items
                .par_iter()
                .try_for_each(|(id, vector)| self.insert(*id, vector))
        };

        if self.config.num_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.num_threads)
                .build()
                .map_err(|e| InvfileError::Config(e.to_string()))?
                .install(insert_all)?;
        } else {
            insert_all()?;
        }

        debug!(
            "indexed {} objects into {} posting lists",
            items.len(),
            self.store.num_rows()
        );
        Ok(())
    }

    /// Resolves a query vector into the posting lists it touches.
    ///
    /// Resets the scratch, drops query entries below the tolerance,
    /// silently skips features absent from the index, and initializes
    /// one cursor per selected list. Query weights obey the same
    /// finite/non-negative contract as inserted vectors.
    pub fn prepare(&self, query: &SparseVector, scratch: &mut WeightedScratch) -> Result<()> {
        validate_weights(query, true)?;
        build_plan(&self.store, query, self.config.tolerance, scratch);
        Ok(())
    }

    /// Scans the prepared posting lists and emits every candidate.
    ///
    /// Accumulates `query_weight * posting_weight` per object over all
    /// selected lists, then calls `callback(object id, 1 - sum)` exactly
    /// once per object that received a contribution — the cosine
    /// distance when both sides are pre-normalized. Emission order is
    /// unspecified. Cost is proportional to the total length of the
    /// selected lists, independent of index size. Bounded top-k
    /// retention is the callback's job.
    pub fn search<F>(&self, scratch: &mut WeightedScratch, mut callback: F)
    where
        F: FnMut(u32, f64),
    {
        for i in 0..scratch.terms.len() {
            let term = scratch.terms[i];
            let list = self.store.read(term.feature);
            let qw = term.weight as f64;
            for posting in &list[scratch.cursors[i]..] {
                *scratch.acc.entry(posting.id).or_insert(0.0) += qw * posting.weight as f64;
            }
            scratch.cursors[i] = list.len();
        }

        for (&id, &sum) in &scratch.acc {
            callback(id, 1.0 - sum);
        }
    }

    /// Returns the number of indexed objects.
    pub fn len(&self) -> usize {
        self.sizes.lock().unwrap().len()
    }

    /// Checks if the index holds no objects.
    pub fn is_empty(&self) -> bool {
        self.sizes.lock().unwrap().is_empty()
    }

    /// Returns the number of features the index was sized for.
    #[inline]
    pub fn num_features(&self) -> usize {
        self.store.num_rows()
    }

    /// Returns the number of retained entries for an object, if indexed.
    pub fn size(&self, id: u32) -> Option<u32> {
        self.sizes.lock().unwrap().get(&id).copied()
    }

    /// Returns statistics about the index.
    pub fn stats(&self) -> IndexStats {
        stats_for(&self.store, self.len())
    }

    /// Exports the index as (feature, object id, weight) triplets, the
    /// coordinate form of the underlying sparse matrix.
    pub fn to_triplets(&self) -> Vec<(u32, u32, f32)> {
        let mut out = Vec::with_capacity(self.store.total_postings());
        for feature in 0..self.store.num_rows() as u32 {
            let list = self.store.read(feature);
            for posting in list.iter() {
                out.push((feature, posting.id, posting.weight));
            }
        }
        out
    }
}
