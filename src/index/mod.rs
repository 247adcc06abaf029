//! Inverted-file indexes over sparse vectors.
//!
//! Two interchangeable variants share the same construction and query
//! surface, chosen once at construction time:
//!
//! - [`WeightedIndex`] stores (object id, weight) postings and answers
//!   cosine queries over pre-normalized vectors.
//! - [`BinaryIndex`] stores bare object ids and answers t-threshold set
//!   queries under a [`SetDistance`](crate::distance::SetDistance).

mod binary;
mod postings;
mod weighted;

pub use binary::BinaryIndex;
pub use postings::{Posting, PostingStore};
pub use weighted::WeightedIndex;

use crate::error::{InvfileError, Result};
use crate::vector::SparseVector;

/// Statistics about an inverted-file index.
#[derive(Debug, Clone)]
pub struct IndexStats {
    /// Number of indexed objects.
    pub num_objects: usize,
    /// Number of features the index was sized for.
    pub num_features: usize,
    /// Number of posting lists with at least one entry.
    pub non_empty_lists: usize,
    /// Total number of postings across all lists.
    pub total_postings: usize,
    /// Length of the longest posting list.
    pub max_list_len: usize,
    /// Average posting list length (over non-empty lists).
    pub avg_list_len: f64,
}

pub(crate) fn stats_for<P: Copy>(store: &PostingStore<P>, num_objects: usize) -> IndexStats {
    let num_features = store.num_rows();
    let mut non_empty_lists = 0;
    let mut total_postings = 0;
    let mut max_list_len = 0;

    for feature in 0..num_features as u32 {
        let len = store.row_len(feature);
        if len > 0 {
            non_empty_lists += 1;
        }
        total_postings += len;
        max_list_len = max_list_len.max(len);
    }

    let avg_list_len = if non_empty_lists > 0 {
        total_postings as f64 / non_empty_lists as f64
    } else {
        0.0
    };

    IndexStats {
        num_objects,
        num_features,
        non_empty_lists,
        total_postings,
        max_list_len,
        avg_list_len,
    }
}

/// Rejects NaN/infinite weights, and negative weights when
/// `require_non_negative` is set.
pub(crate) fn validate_weights(vector: &SparseVector, require_non_negative: bool) -> Result<()> {
    for (feature, weight) in vector.iter() {
        if !weight.is_finite() {
            return Err(InvfileError::NonFiniteWeight { feature, weight });
        }
        if require_non_negative && weight < 0.0 {
            return Err(InvfileError::NegativeWeight { feature, weight });
        }
    }
    Ok(())
}

/// Rejects feature ids outside the index's feature universe.
pub(crate) fn validate_features(vector: &SparseVector, num_features: usize) -> Result<()> {
    for (feature, _) in vector.iter() {
        if feature as usize >= num_features {
            return Err(InvfileError::FeatureOutOfRange {
                feature,
                max: num_features,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_weights() {
        let ok = SparseVector::from_pairs(&[(1, 0.5)]);
        assert!(validate_weights(&ok, true).is_ok());

        let nan = SparseVector::from_pairs(&[(1, f32::NAN)]);
        assert!(matches!(
            validate_weights(&nan, false),
            Err(InvfileError::NonFiniteWeight { feature: 1, .. })
        ));

        let negative = SparseVector::from_pairs(&[(2, -1.0)]);
        assert!(validate_weights(&negative, false).is_ok());
        assert!(matches!(
            validate_weights(&negative, true),
            Err(InvfileError::NegativeWeight { feature: 2, .. })
        ));
    }

    #[test]
    fn test_validate_features() {
        let v = SparseVector::from_pairs(&[(9, 1.0)]);
        assert!(validate_features(&v, 10).is_ok());
        assert!(matches!(
            validate_features(&v, 9),
            Err(InvfileError::FeatureOutOfRange { feature: 9, max: 9 })
        ));
    }
}
