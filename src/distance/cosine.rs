//! Cosine and angle distances for sparse vectors.

use crate::distance::VectorDistance;
use crate::vector::SparseVector;

/// Cosine similarity with renormalization.
///
/// A zero vector has no direction; it is treated as orthogonal to
/// everything, so every distance below falls back to its maximum.
fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let product = a.norm() * b.norm();
    if product == 0.0 {
        0.0
    } else {
        a.dot(b) / product
    }
}

/// Cosine distance: `1 - dot(a, b) / (norm(a) * norm(b))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineDistance;

impl VectorDistance for CosineDistance {
    fn evaluate(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        1.0 - cosine_similarity(a, b)
    }
}

/// Cosine distance for pre-normalized vectors: `1 - dot(a, b)`.
///
/// Both inputs must already have unit L2 norm (see
/// [`SparseVector::normalize`]); this is a caller contract and is not
/// checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedCosineDistance;

impl VectorDistance for NormalizedCosineDistance {
    fn evaluate(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        1.0 - a.dot(b)
    }
}

/// Angle between two sparse vectors, in radians.
///
/// The cosine is clamped to `[-1, 1]` before taking the arc cosine, so
/// floating point drift cannot produce NaN.
#[derive(Debug, Clone, Copy, Default)]
pub struct AngleDistance;

impl VectorDistance for AngleDistance {
    fn evaluate(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        cosine_similarity(a, b).clamp(-1.0, 1.0).acos()
    }
}

/// Angle between two pre-normalized sparse vectors, in radians.
///
/// Skips the renormalization step; both inputs must already have unit
/// L2 norm.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedAngleDistance;

impl VectorDistance for NormalizedAngleDistance {
    fn evaluate(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        a.dot(b).clamp(-1.0, 1.0).acos()
    }
}
