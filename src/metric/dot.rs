//! Dot-product distance.

use super::{check_dims, Metric, Scalar};
use crate::error::HnswError;

/// Dot-product distance: `max(0, 1 - <a, b>)`.
///
/// This behaves like a cosine-surrogate only if callers pre-normalize their
/// vectors before inserting or searching; the index itself never normalizes
/// anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProductDistance;

impl Metric for DotProductDistance {
    #[inline]
    fn distance(&self, a: &[Scalar], b: &[Scalar]) -> Result<Scalar, HnswError> {
        check_dims(a, b)?;

        let mut product: Scalar = 0.0;
        for (x, y) in a.iter().zip(b.iter()) {
            product += x * y;
        }

        Ok((1.0 - product).max(0.0))
    }
}
