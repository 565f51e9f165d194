//! Unified error hierarchy for the HNSW engine.
//!
//! The engine surfaces a narrow set of error kinds. It never logs and never
//! recovers on the caller's behalf: every fallible public operation returns
//! a `Result` and leaves the index exactly as it was before the call.

use thiserror::Error;

/// Errors produced by the graph engine's public operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HnswError {
    /// `insert` was called with a key that already exists in the index.
    #[error("key already exists")]
    DuplicateKey,

    /// A distance computation was attempted between vectors of different
    /// lengths.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality the index (or the first vector) expects.
        expected: usize,
        /// The dimensionality actually supplied.
        actual: usize,
    },

    /// Configuration carried a value outside the enums this crate knows
    /// about. Surfaced only at construction time.
    #[error("unrecognized configuration option: {0}")]
    UnknownOption(String),

    /// One of the invariants in the data model was violated. This should
    /// never happen; if `check()` ever returns `false` after a public
    /// operation completes, that is a bug in this crate, not in the caller.
    #[error("internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}
