//! # invfile - In-memory Inverted Files for Sparse k-NN Search
//!
//! invfile builds a posting-list (inverted file) index over sparse
//! feature vectors — bag-of-features data such as text, sets, and
//! weighted profiles — and answers nearest-neighbor queries by scanning
//! only the posting lists a query touches, instead of comparing against
//! every indexed object.
//!
//! ## Overview
//!
//! Two index variants share one surface, chosen at construction:
//!
//! - **Weighted**: stores (object id, weight) postings and solves k-NN
//!   under the cosine distance over pre-normalized vectors.
//! - **Binary**: stores feature presence and solves the t-threshold
//!   problem — objects present in at least `t` of the query's posting
//!   lists — scored under a configurable set distance (intersection,
//!   Jaccard, Dice, or cosine over sets).
//!
//! Construction is concurrent: every posting list carries its own lock,
//! so inserting objects with disjoint feature sets never blocks. Queries
//! are read-only and may run concurrently, each with its own reusable
//! scratch state.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use invfile::{IndexConfig, QueryScratch, SparseVector, WeightedIndex};
//!
//! let mut v = SparseVector::from_pairs(&[(0, 0.6), (3, 0.8)]);
//! v.normalize();
//!
//! let index = WeightedIndex::new(16);
//! index.insert(0, &v)?;
//!
//! let mut scratch = QueryScratch::new();
//! index.prepare(&v, &mut scratch)?;
//! index.search(&mut scratch, |id, dist| {
//!     println!("candidate {id} at distance {dist}");
//! });
//! ```
//!
//! ## Architecture
//!
//! - [`vector`] - Mapping-based sparse vectors and their algebra
//! - [`distance`] - Cosine/angle distances and set dissimilarities
//! - [`index`] - Posting-list store and the two index variants
//! - [`query`] - Query preparation and reusable scratch state
//!
//! The search engine emits every qualifying candidate through a caller
//! callback; bounded top-k retention belongs to the caller's collector.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod query;
pub mod vector;

// Re-export commonly used types
pub use config::IndexConfig;
pub use distance::{
    AngleDistance, CosineDistance, NormalizedAngleDistance, NormalizedCosineDistance, SetDistance,
    VectorDistance,
};
pub use error::{InvfileError, Result};
pub use index::{BinaryIndex, IndexStats, Posting, WeightedIndex};
pub use query::{BinaryScratch, QueryScratch, QueryTerm, WeightedScratch};
pub use vector::{centroid, SparseVector};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default weight tolerance: entries below this magnitude are dropped
/// at insertion and at query time.
pub const DEFAULT_TOLERANCE: f32 = 1e-6;
