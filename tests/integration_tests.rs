//! Integration tests for the invfile inverted-file library.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use invfile::{
    BinaryIndex, BinaryScratch, IndexConfig, NormalizedCosineDistance, QueryScratch, SetDistance,
    SparseVector, VectorDistance, WeightedIndex, WeightedScratch,
};

/// Bounded top-k collector over (distance, object id) pairs.
///
/// Ties are broken by object id, and distances are snapped to a 1e-9
/// grid first so both the engine and the brute-force reference order
/// near-equal sums the same way.
struct TopK {
    k: usize,
    hits: Vec<(i64, u32)>,
}

impl TopK {
    fn new(k: usize) -> Self {
        Self { k, hits: Vec::new() }
    }

    fn push(&mut self, id: u32, dist: f64) {
        self.hits.push(((dist * 1e9).round() as i64, id));
    }

    fn ids(mut self) -> Vec<u32> {
        self.hits.sort_unstable();
        self.hits.truncate(self.k);
        self.hits.into_iter().map(|(_, id)| id).collect()
    }
}

/// Generates normalized sparse vectors over the given feature universe.
fn random_vectors(
    rng: &mut ChaCha8Rng,
    count: usize,
    num_features: u32,
    nnz: usize,
) -> Vec<(u32, SparseVector)> {
    (0..count as u32)
        .map(|id| {
            let mut v = SparseVector::new();
            while v.len() < nnz {
                let feature = rng.gen_range(0..num_features);
                let weight = rng.gen_range(0.1..1.0f32);
                v.insert(feature, weight);
            }
            v.normalize();
            (id, v)
        })
        .collect()
}

fn feature_set(v: &SparseVector) -> HashSet<u32> {
    v.iter().map(|(f, _)| f).collect()
}

#[test]
fn test_weighted_top_k_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let num_features = 32;
    let vectors = random_vectors(&mut rng, 60, num_features, 6);

    let index =
        WeightedIndex::build(IndexConfig::with_num_features(num_features as usize), &vectors)
            .unwrap();

    let queries = random_vectors(&mut rng, 10, num_features, 6);
    let mut scratch: WeightedScratch = QueryScratch::new();

    for k in [1, 5, 20, 60] {
        for (_, query) in &queries {
            let mut engine = TopK::new(k);
            index.prepare(query, &mut scratch).unwrap();
            index.search(&mut scratch, |id, dist| engine.push(id, dist));

            // The engine only emits objects sharing a feature with the
            // query; everything else sits at distance 1 and can only pad
            // the tail, so restrict the reference to the same candidates.
            let mut brute = TopK::new(k);
            for (id, v) in &vectors {
                let dist = NormalizedCosineDistance.evaluate(query, v);
                if dist < 1.0 - 1e-9 {
                    brute.push(*id, dist);
                }
            }

            assert_eq!(engine.ids(), brute.ids(), "top-{k} mismatch");
        }
    }
}

#[test]
fn test_engine_distances_match_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let vectors = random_vectors(&mut rng, 40, 24, 5);
    let index = WeightedIndex::build(IndexConfig::with_num_features(24), &vectors).unwrap();

    let mut scratch: WeightedScratch = QueryScratch::new();
    for (_, query) in random_vectors(&mut rng, 5, 24, 5) {
        index.prepare(&query, &mut scratch).unwrap();

        let mut candidates = Vec::new();
        index.search(&mut scratch, |id, dist| candidates.push((id, dist)));

        for (id, dist) in &candidates {
            let expected = NormalizedCosineDistance.evaluate(&query, &vectors[*id as usize].1);
            assert!(
                (dist - expected).abs() < 1e-9,
                "object {id}: engine {dist} vs brute force {expected}"
            );
        }

        // Everything the engine skipped shares no feature with the query.
        let emitted: HashSet<u32> = candidates.iter().map(|(id, _)| *id).collect();
        let query_features = feature_set(&query);
        for (id, v) in &vectors {
            if !emitted.contains(id) {
                assert!(feature_set(v).is_disjoint(&query_features));
            }
        }
    }
}

#[test]
fn test_threshold_sweep_union_to_intersection() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let vectors = random_vectors(&mut rng, 50, 16, 4);
    let index =
        BinaryIndex::build(IndexConfig::with_num_features(16), SetDistance::Jaccard, &vectors)
            .unwrap();

    let mut scratch: BinaryScratch = QueryScratch::new();
    for (_, query) in random_vectors(&mut rng, 8, 16, 3) {
        index.prepare(&query, &mut scratch).unwrap();
        let selected: HashSet<u32> = scratch.terms().iter().map(|t| t.feature).collect();
        if selected.is_empty() {
            continue;
        }

        for t in 1..=selected.len() {
            index.prepare(&query, &mut scratch).unwrap();
            let mut ids = Vec::new();
            index.search(&mut scratch, t, |id, _| ids.push(id)).unwrap();
            ids.sort_unstable();

            let mut expected: Vec<u32> = vectors
                .iter()
                .filter(|(_, v)| feature_set(v).intersection(&selected).count() >= t)
                .map(|(id, _)| *id)
                .collect();
            expected.sort_unstable();

            assert_eq!(ids, expected, "threshold {t} of {}", selected.len());
        }
    }
}

#[test]
fn test_parallel_build_equals_sequential() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let vectors = random_vectors(&mut rng, 80, 20, 5);

    let parallel = WeightedIndex::build(
        IndexConfig {
            num_features: 20,
            num_threads: 4,
            ..Default::default()
        },
        &vectors,
    )
    .unwrap();

    let sequential = WeightedIndex::new(20);
    for (id, v) in &vectors {
        sequential.insert(*id, v).unwrap();
    }

    // Posting order within a shared list depends on scheduling; content
    // must not.
    let mut a = parallel.to_triplets();
    let mut b = sequential.to_triplets();
    a.sort_by(|x, y| x.partial_cmp(y).unwrap());
    b.sort_by(|x, y| x.partial_cmp(y).unwrap());
    assert_eq!(a, b);
    assert_eq!(parallel.len(), sequential.len());
}

#[test]
fn test_concurrent_insertion_disjoint_features() {
    // N objects with pairwise-disjoint feature sets inserted by T
    // workers must produce the same index as sequential insertion.
    let num_objects = 64u32;
    let index = Arc::new(BinaryIndex::new(
        num_objects as usize * 2,
        SetDistance::Jaccard,
    ));

    let handles: Vec<_> = (0..4u32)
        .map(|worker| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for id in (worker..num_objects).step_by(4) {
                    let v = SparseVector::from_pairs(&[(id * 2, 1.0), (id * 2 + 1, 1.0)]);
                    index.insert(id, &v).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let reference = BinaryIndex::new(num_objects as usize * 2, SetDistance::Jaccard);
    for id in 0..num_objects {
        let v = SparseVector::from_pairs(&[(id * 2, 1.0), (id * 2 + 1, 1.0)]);
        reference.insert(id, &v).unwrap();
    }

    // Disjoint feature sets mean every posting list holds at most one
    // entry, so even ordering is deterministic.
    assert_eq!(index.to_triplets(), reference.to_triplets());
    assert_eq!(index.len(), reference.len());
}

#[test]
fn test_binary_scenario_from_set_universe() {
    // Universe {f1..f5}, object1 = {f1, f3}, object2 = {f2, f3}.
    let index = BinaryIndex::new(5, SetDistance::Jaccard);
    index
        .insert(1, &SparseVector::from_pairs(&[(0, 1.0), (2, 1.0)]))
        .unwrap();
    index
        .insert(2, &SparseVector::from_pairs(&[(1, 1.0), (2, 1.0)]))
        .unwrap();

    let mut scratch: BinaryScratch = QueryScratch::new();

    // Query {f3}, t = 1: union.
    index
        .prepare(&SparseVector::from_pairs(&[(2, 1.0)]), &mut scratch)
        .unwrap();
    let mut ids = Vec::new();
    index.search(&mut scratch, 1, |id, _| ids.push(id)).unwrap();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);

    // Query {f1, f3}, t = 2: object1 counts twice, object2 once.
    index
        .prepare(
            &SparseVector::from_pairs(&[(0, 1.0), (2, 1.0)]),
            &mut scratch,
        )
        .unwrap();
    let mut ids = Vec::new();
    index.search(&mut scratch, 2, |id, _| ids.push(id)).unwrap();
    assert_eq!(ids, vec![1]);
}

#[test]
fn test_weighted_scenario_perfect_match() {
    // q = v = {f1: 0.6, f3: 0.8}, already normalized: distance ~ 0.
    let v = SparseVector::from_pairs(&[(0, 0.6), (2, 0.8)]);
    let index = WeightedIndex::new(4);
    index.insert(0, &v).unwrap();

    let mut scratch: WeightedScratch = QueryScratch::new();
    index.prepare(&v, &mut scratch).unwrap();

    let mut hits = Vec::new();
    index.search(&mut scratch, |id, dist| hits.push((id, dist)));

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, 0);
    assert!(hits[0].1.abs() < 1e-6);
}

#[test]
fn test_concurrent_queries_share_the_index() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let vectors = random_vectors(&mut rng, 30, 16, 4);
    let index = Arc::new(
        WeightedIndex::build(IndexConfig::with_num_features(16), &vectors).unwrap(),
    );

    let handles: Vec<_> = vectors
        .iter()
        .take(4)
        .map(|(id, query)| {
            let index = Arc::clone(&index);
            let id = *id;
            let query = query.clone();
            thread::spawn(move || {
                // One private scratch per worker.
                let mut scratch: WeightedScratch = QueryScratch::new();
                index.prepare(&query, &mut scratch).unwrap();

                let mut best = (u32::MAX, f64::MAX);
                index.search(&mut scratch, |cand, dist| {
                    if dist < best.1 {
                        best = (cand, dist);
                    }
                });

                // Each vector's own nearest neighbor is itself.
                assert_eq!(best.0, id);
                assert!(best.1.abs() < 1e-6);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
