//! Distance functors (C1).
//!
//! A metric is a pure, deterministic function of two equal-length vectors
//! to a non-negative scalar. The engine treats it as a black box: it never
//! assumes the triangle inequality, and it never recomputes a distance it
//! has already stored on a link (see [`crate::hnsw::links`]).

mod cosine;
mod dot;

pub use cosine::CosineDistance;
pub use dot::DotProductDistance;

use crate::error::HnswError;

/// The numeric type a [`Metric`] returns.
///
/// Fixed at `f32` for this crate: the scalar type drives memory footprint
/// for every stored link, and silently widening it would defeat the point
/// of choosing it deliberately.
pub type Scalar = f32;

/// A distance function over fixed-dimension vectors.
///
/// Implementations must be stable and deterministic: calling `distance`
/// twice on the same inputs must return the same value.
pub trait Metric: Default {
    /// Returns the distance between `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns [`HnswError::DimensionMismatch`] if `a.len() != b.len()`.
    fn distance(&self, a: &[Scalar], b: &[Scalar]) -> Result<Scalar, HnswError>;
}

pub(crate) fn check_dims(a: &[Scalar], b: &[Scalar]) -> Result<(), HnswError> {
    if a.len() != b.len() {
        return Err(HnswError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}
