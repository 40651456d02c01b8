//! Error types for co-occurrence counting.

use thiserror::Error;

/// Every way a counting run can fail. None of them are recovered locally:
/// a run either returns the full matrix or one of these.
#[derive(Debug, Error)]
pub enum CoocError {
    /// Invalid configuration, detected before any worker starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// The sentence source failed while a shard was being filled.
    #[error("sentence source failed while reading shard {shard}: {message}")]
    Source { shard: usize, message: String },

    /// A vocabulary grew past the index space of a packed cell key.
    #[error("vocabulary index {0} does not fit in 32 bits")]
    IndexOverflow(usize),

    /// An entry of the accumulator lies outside the requested matrix shape.
    #[error("cell ({row}, {col}) is outside a {rows}x{cols} matrix")]
    OutOfShape {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A partial result that does not fit the reducer it was handed to.
    #[error("inconsistent partial result from shard {shard}: {message}")]
    Inconsistent { shard: usize, message: String },

    /// Reduction lost or duplicated counts.
    #[error("merge invariant violated: partial tables hold {expected} pairs, accumulator holds {found}")]
    MergeInvariant { expected: u64, found: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for counting operations.
pub type Result<T> = std::result::Result<T, CoocError>;
