//! Error types for the invfile library.

use thiserror::Error;

/// The main error type for invfile operations.
#[derive(Error, Debug)]
pub enum InvfileError {
    /// A weight was NaN or infinite.
    #[error("non-finite weight {weight} for feature {feature}")]
    NonFiniteWeight {
        /// Feature id carrying the offending weight.
        feature: u32,
        /// The offending weight.
        weight: f32,
    },

    /// A negative weight reached a weighted (cosine) index.
    #[error("negative weight {weight} for feature {feature}: weighted indexes require non-negative weights")]
    NegativeWeight {
        /// Feature id carrying the offending weight.
        feature: u32,
        /// The offending weight.
        weight: f32,
    },

    /// A feature id exceeded the index's feature universe.
    #[error("feature id out of range: {feature} >= {max}")]
    FeatureOutOfRange {
        /// The feature id that was out of range.
        feature: u32,
        /// Number of features the index was sized for.
        max: usize,
    },

    /// An object id was inserted twice.
    ///
    /// Posting lists are append-only; a changed vector must be inserted
    /// under a fresh object id.
    #[error("object {0} is already indexed")]
    DuplicateObject(u32),

    /// A search threshold fell outside `[1, |Q|]`.
    #[error("invalid threshold {t}: must be between 1 and {lists} (number of selected posting lists)")]
    InvalidThreshold {
        /// The requested threshold.
        t: usize,
        /// Number of posting lists selected for the query.
        lists: usize,
    },

    /// Empty input.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for invfile operations.
pub type Result<T> = std::result::Result<T, InvfileError>;
