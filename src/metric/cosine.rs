//! Cosine distance.

use super::{check_dims, Metric, Scalar};
use crate::error::HnswError;

/// Tiny-norm guard threshold: a vector whose squared norm falls below this
/// is treated as the zero vector for the purposes of this distance.
const NEAR_ZERO: Scalar = Scalar::MIN_POSITIVE * 2.0;

/// Cosine distance: `max(0, 1 - <a, b> / (||a|| * ||b||))`.
///
/// Guards against division by a near-zero norm: if both vectors are
/// near-zero the distance is `1.0` (undefined direction, treated as
/// maximally dissimilar); if only one is, the distance is `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineDistance;

impl Metric for CosineDistance {
    #[inline]
    fn distance(&self, a: &[Scalar], b: &[Scalar]) -> Result<Scalar, HnswError> {
        check_dims(a, b)?;

        let mut dot: Scalar = 0.0;
        let mut norm_a: Scalar = 0.0;
        let mut norm_b: Scalar = 0.0;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }

        if norm_a < NEAR_ZERO {
            return Ok(if norm_b < NEAR_ZERO { 1.0 } else { 0.0 });
        }
        if norm_b < NEAR_ZERO {
            return Ok(0.0);
        }

        let cosine = (dot / norm_a.sqrt() / norm_b.sqrt()).clamp(-1.0, 1.0);
        Ok((1.0 - cosine).max(0.0))
    }
}
