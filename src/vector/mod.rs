//! Mapping-based sparse vectors and their algebra.

use std::collections::HashMap;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::error::{InvfileError, Result};

/// A sparse vector mapping feature ids to weights.
///
/// Keys are unique; an absent key is equivalent to weight zero. Weighted
/// vectors are expected to be L2-normalized (see [`SparseVector::normalize`])
/// before cosine search, but the algebra itself does not enforce this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    weights: HashMap<u32, f32>,
}

impl SparseVector {
    /// Creates an empty sparse vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sparse vector from (feature, weight) pairs.
    ///
    /// Later pairs overwrite earlier ones with the same feature id.
    pub fn from_pairs(pairs: &[(u32, f32)]) -> Self {
        Self {
            weights: pairs.iter().copied().collect(),
        }
    }

    /// Returns the weight for a feature, or 0.0 if absent.
    #[inline]
    pub fn weight(&self, feature: u32) -> f32 {
        self.weights.get(&feature).copied().unwrap_or(0.0)
    }

    /// Sets the weight for a feature.
    #[inline]
    pub fn insert(&mut self, feature: u32, weight: f32) {
        self.weights.insert(feature, weight);
    }

    /// Returns the number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Checks if the vector has no stored entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Returns an iterator over (feature, weight) entries.
    ///
    /// Iteration order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.weights.iter().map(|(&f, &w)| (f, w))
    }

    /// Computes the dot product with another sparse vector.
    ///
    /// Iterates the smaller of the two maps; features missing on either
    /// side contribute zero. Symmetric in its arguments.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };

        small
            .weights
            .iter()
            .filter_map(|(f, &w)| large.weights.get(f).map(|&v| w as f64 * v as f64))
            .sum()
    }

    /// Computes the L2 norm.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Scales the vector to unit L2 norm.
    ///
    /// A zero vector is left unchanged.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            let inv = (1.0 / norm) as f32;
            for w in self.weights.values_mut() {
                *w *= inv;
            }
        }
    }

    /// Multiplies every weight by a scalar factor.
    pub fn scale(&mut self, factor: f32) {
        for w in self.weights.values_mut() {
            *w *= factor;
        }
    }
}

impl FromIterator<(u32, f32)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (u32, f32)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

impl AddAssign<&SparseVector> for SparseVector {
    /// Adds another vector in place, over the union of keys.
    fn add_assign(&mut self, other: &SparseVector) {
        for (&f, &w) in &other.weights {
            *self.weights.entry(f).or_insert(0.0) += w;
        }
    }
}

impl SubAssign<&SparseVector> for SparseVector {
    /// Subtracts another vector in place, over the union of keys.
    fn sub_assign(&mut self, other: &SparseVector) {
        for (&f, &w) in &other.weights {
            *self.weights.entry(f).or_insert(0.0) -= w;
        }
    }
}

impl Add<&SparseVector> for &SparseVector {
    type Output = SparseVector;

    fn add(self, other: &SparseVector) -> SparseVector {
        let mut out = self.clone();
        out += other;
        out
    }
}

impl Sub<&SparseVector> for &SparseVector {
    type Output = SparseVector;

    fn sub(self, other: &SparseVector) -> SparseVector {
        let mut out = self.clone();
        out -= other;
        out
    }
}

/// Computes the element-wise mean of a list of sparse vectors.
///
/// Returns an [`InvfileError::EmptyInput`] error for an empty list.
pub fn centroid(vectors: &[SparseVector]) -> Result<SparseVector> {
    if vectors.is_empty() {
        return Err(InvfileError::EmptyInput("centroid of no vectors".into()));
    }

    let mut sum = SparseVector::new();
    for v in vectors {
        sum += v;
    }
    sum.scale(1.0 / vectors.len() as f32);
    Ok(sum)
}
