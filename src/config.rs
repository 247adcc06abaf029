//! Configuration for inverted-file indexes.

use serde::{Deserialize, Serialize};

/// Configuration shared by both index variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Number of distinct feature ids the index can hold.
    ///
    /// Posting lists and their locks are allocated up front for this many
    /// features; inserting a vector with a feature id at or above this
    /// bound is an error. Default: 65,536.
    pub num_features: usize,

    /// Weights with absolute value below this are dropped at insertion
    /// and at query time.
    /// Default: 1e-6.
    pub tolerance: f32,

    /// Number of threads used by batch construction.
    /// Default: 0 (use all available cores).
    pub num_threads: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            num_features: 65_536,
            tolerance: crate::DEFAULT_TOLERANCE,
            num_threads: 0,
        }
    }
}

impl IndexConfig {
    /// Creates a configuration for the given feature universe, with
    /// defaults for everything else.
    pub fn with_num_features(num_features: usize) -> Self {
        Self {
            num_features,
            ..Default::default()
        }
    }
}
