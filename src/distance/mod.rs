//! Distance functions over sparse vectors and sets.

mod cosine;
mod set;

pub use cosine::{AngleDistance, CosineDistance, NormalizedAngleDistance, NormalizedCosineDistance};
pub use set::SetDistance;

use crate::vector::SparseVector;

/// Trait for distance functions between sparse vectors.
pub trait VectorDistance {
    /// Evaluates the distance between two sparse vectors.
    ///
    /// Returns 0.0 for identical directions; larger values mean farther
    /// apart.
    fn evaluate(&self, a: &SparseVector, b: &SparseVector) -> f64;
}
