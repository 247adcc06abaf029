//! Binary inverted index for t-threshold set search.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use rayon::prelude::*;

use crate::config::IndexConfig;
use crate::distance::SetDistance;
use crate::error::{InvfileError, Result};
use crate::index::postings::PostingStore;
use crate::index::{stats_for, validate_features, validate_weights, IndexStats};
use crate::query::{build_plan, BinaryScratch};
use crate::vector::SparseVector;

/// An inverted index that records feature presence, not weights.
///
/// Postings store bare object ids; the per-object size map records how
/// many features each object retained, which feeds the set-distance
/// denominators at query time. The distance is fixed at construction.
///
/// Shares the concurrency model of
/// [`WeightedIndex`](crate::index::WeightedIndex): per-feature locks for
/// concurrent construction, read-only concurrent queries afterwards.
#[derive(Debug)]
pub struct BinaryIndex {
    store: PostingStore<u32>,
    sizes: Mutex<HashMap<u32, u32>>,
    dist: SetDistance,
    config: IndexConfig,
}

impl BinaryIndex {
    /// Creates an empty index sized for the given feature universe.
    pub fn new(num_features: usize, dist: SetDistance) -> Self {
        Self::with_config(IndexConfig::with_num_features(num_features), dist)
    }

    /// Creates an empty index from a configuration.
    pub fn with_config(config: IndexConfig, dist: SetDistance) -> Self {
        Self {
            store: PostingStore::with_rows(config.num_features),
            sizes: Mutex::new(HashMap::new()),
            dist,
            config,
        }
    }

    /// Builds an index from a collection of (object id, vector) pairs,
    /// ingesting them in parallel.
    pub fn build(
        config: IndexConfig,
        dist: SetDistance,
        items: &[(u32, SparseVector)],
    ) -> Result<Self> {
        let index = Self::with_config(config, dist);
        index.insert_batch(items)?;
        Ok(index)
    }

    /// Inserts one object's vector as a feature set.
    ///
    /// Only presence is recorded: a feature belongs to the object's set
    /// when its weight magnitude reaches the tolerance. Weights must be
    /// finite (sign is irrelevant here) and feature ids must lie inside
    /// the configured universe; validation happens before any posting is
    /// appended. Object ids may be inserted once.
    pub fn insert(&self, id: u32, vector: &SparseVector) -> Result<()> {
        validate_weights(vector, false)?;
        validate_features(vector, self.config.num_features)?;

        let retained: Vec<u32> = vector
            .iter()
            .filter(|(_, w)| w.abs() >= self.config.tolerance)
            .map(|(feature, _)| feature)
            .collect();

        {
            let mut sizes = self.sizes.lock().unwrap();
            if sizes.contains_key(&id) {
                return Err(InvfileError::DuplicateObject(id));
            }
            sizes.insert(id, retained.len() as u32);
        }

        for feature in retained {
            self.store.append(feature, id);
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
    /// Resets the scratch, drops query entries whose magnitude is below
    /// the tolerance, silently skips features absent from the index, and
    /// initializes one cursor per selected list.
    pub fn prepare(&self, query: &SparseVector, scratch: &mut BinaryScratch) -> Result<()> {
        validate_weights(query, false)?;
        build_plan(&self.store, query, self.config.tolerance, scratch);
        Ok(())
    }

    /// Scans the prepared posting lists and emits every object present
    /// in at least `t` of them.
    ///
    /// `t = 1` yields the union of the selected lists and `t = |Q|`
    /// their intersection; values outside `[1, |Q|]` are an
    /// [`InvfileError::InvalidThreshold`]. An empty selection (the query
    /// only touched unknown or empty features) yields no candidates and
    /// is not an error. Every selected list is scanned in full; objects
    /// are filtered by the threshold only after accumulation, so no
    /// qualifying candidate is ever missed.
    ///
    /// For each qualifying object the callback receives the index's
    /// [`SetDistance`] evaluated at (match count, `|Q|`, object set
    /// size), exactly once per object. Emission order is unspecified.
    pub fn search<F>(&self, scratch: &mut BinaryScratch, t: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(u32, f64),
    {
        if scratch.terms.is_empty() {
            return Ok(());
        }
        if t < 1 || t > scratch.terms.len() {
            return Err(InvfileError::InvalidThreshold {
                t,
                lists: scratch.terms.len(),
            });
        }

        for i in 0..scratch.terms.len() {
            let term = scratch.terms[i];
            let list = self.store.read(term.feature);
            for &id in &list[scratch.cursors[i]..] {
                *scratch.acc.entry(id).or_insert(0) += 1;
            }
            scratch.cursors[i] = list.len();
        }

        let query_len = scratch.terms.len() as u32;
        let sizes = self.sizes.lock().unwrap();
        for (&id, &count) in &scratch.acc {
            if (count as usize) < t {
                continue;
            }
            let object_len = sizes.get(&id).copied().unwrap_or(0);
            callback(id, self.dist.from_counts(count, query_len, object_len));
        }
        Ok(())
    }

    /// Returns the set distance fixed at construction.
    #[inline]
    pub fn dist(&self) -> SetDistance {
        self.dist
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

    /// Returns the number of retained features for an object, if indexed.
    pub fn size(&self, id: u32) -> Option<u32> {
        self.sizes.lock().unwrap().get(&id).copied()
    }

    /// Returns statistics about the index.
    pub fn stats(&self) -> IndexStats {
        stats_for(&self.store, self.len())
    }

    /// Exports the index as (feature, object id, 1.0) triplets, the
    /// coordinate form of the underlying binary sparse matrix.
    pub fn to_triplets(&self) -> Vec<(u32, u32, f32)> {
        let mut out = Vec::with_capacity(self.store.total_postings());
        for feature in 0..self.store.num_rows() as u32 {
            let list = self.store.read(feature);
            for &id in list.iter() {
                out.push((feature, id, 1.0));
            }
        }
        out
    }
}
