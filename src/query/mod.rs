//! Query preparation and reusable per-query scratch state.

use std::collections::HashMap;

use crate::index::PostingStore;
use crate::vector::SparseVector;

/// One selected posting list for a query: feature id and query weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryTerm {
    /// Feature id whose posting list will be scanned.
    pub feature: u32,
    /// The query's weight for this feature.
    pub weight: f32,
}

/// Reusable scratch state for one in-flight query.
///
/// Holds the selected terms, a parallel array of scan cursors, and the
/// accumulator mapping object ids to partial scores. The caller owns it
/// and passes it into `prepare`/`search`; allocations are reused across
/// queries. It is not valid to share one instance between concurrently
/// executing queries — use one per worker.
#[derive(Debug, Default)]
pub struct QueryScratch<A> {
    pub(crate) terms: Vec<QueryTerm>,
    pub(crate) cursors: Vec<usize>,
    pub(crate) acc: HashMap<u32, A>,
}

/// Scratch for weighted (cosine) queries: accumulates dot-product sums.
pub type WeightedScratch = QueryScratch<f64>;

/// Scratch for binary (set) queries: accumulates match counters.
pub type BinaryScratch = QueryScratch<u32>;

impl<A> QueryScratch<A> {
    /// Creates empty scratch state.
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
            cursors: Vec::new(),
            acc: HashMap::new(),
        }
    }

    /// Returns the posting lists selected by the last `prepare` call.
    pub fn terms(&self) -> &[QueryTerm] {
        &self.terms
    }

    /// Number of posting lists selected by the last `prepare` call.
    #[inline]
    pub fn num_selected(&self) -> usize {
        self.terms.len()
    }

    /// Clears terms, cursors, and the accumulator.
    pub fn clear(&mut self) {
        self.terms.clear();
        self.cursors.clear();
        self.acc.clear();
    }
}

/// Resolves a query vector into selected posting lists plus fresh
/// cursors, resetting the scratch first.
///
/// Entries below the tolerance are dropped; features that are out of
/// range or have an empty posting list are skipped (an absent list is an
/// empty list and contributes nothing). Terms are ordered shortest
/// posting list first; the ordering affects performance only.
pub(crate) fn build_plan<P: Copy, A>(
    store: &PostingStore<P>,
    query: &SparseVector,
    tolerance: f32,
    scratch: &mut QueryScratch<A>,
) {
    scratch.clear();

    for (feature, weight) in query.iter() {
        if weight.abs() < tolerance {
            continue;
        }
        if store.row_len(feature) == 0 {
            continue;
        }
        scratch.terms.push(QueryTerm { feature, weight });
    }

    scratch
        .terms
        .sort_unstable_by_key(|term| store.row_len(term.feature));
    scratch.cursors.resize(scratch.terms.len(), 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_lens(lens: &[usize]) -> PostingStore<u32> {
        let store = PostingStore::with_rows(lens.len());
        for (feature, &len) in lens.iter().enumerate() {
            for id in 0..len as u32 {
                store.append(feature as u32, id);
            }
        }
        store
    }

    #[test]
    fn test_plan_skips_below_tolerance_and_empty_lists() {
        let store = store_with_lens(&[3, 0, 2]);
        let query = SparseVector::from_pairs(&[(0, 0.5), (1, 0.5), (2, 1e-9)]);
        let mut scratch: BinaryScratch = QueryScratch::new();

        build_plan(&store, &query, 1e-6, &mut scratch);

        // Feature 1 has an empty list, feature 2 is below tolerance.
        assert_eq!(scratch.num_selected(), 1);
        assert_eq!(scratch.terms()[0].feature, 0);
        assert_eq!(scratch.cursors, vec![0]);
    }

    #[test]
    fn test_plan_skips_out_of_range_features() {
        let store = store_with_lens(&[1]);
        let query = SparseVector::from_pairs(&[(0, 1.0), (42, 1.0)]);
        let mut scratch: BinaryScratch = QueryScratch::new();

        build_plan(&store, &query, 1e-6, &mut scratch);
        assert_eq!(scratch.num_selected(), 1);
        assert_eq!(scratch.terms()[0].feature, 0);
    }

    #[test]
    fn test_plan_orders_shortest_list_first() {
        let store = store_with_lens(&[5, 1, 3]);
        let query = SparseVector::from_pairs(&[(0, 1.0), (1, 1.0), (2, 1.0)]);
        let mut scratch: WeightedScratch = QueryScratch::new();

        build_plan(&store, &query, 1e-6, &mut scratch);

        let order: Vec<u32> = scratch.terms().iter().map(|t| t.feature).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_plan_resets_previous_state() {
        let store = store_with_lens(&[2, 2]);
        let mut scratch: BinaryScratch = QueryScratch::new();
        scratch.acc.insert(7, 3);
        scratch.cursors.push(99);

        let query = SparseVector::from_pairs(&[(0, 1.0)]);
        build_plan(&store, &query, 1e-6, &mut scratch);

        assert!(scratch.acc.is_empty());
        assert_eq!(scratch.cursors, vec![0]);
    }
}
