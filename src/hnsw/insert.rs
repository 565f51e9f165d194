//! Insert coordinator (C7).
//!
//! Draws a random height for the new node, descends the existing graph
//! top-down to refine an entry point, then on every layer the new node
//! occupies runs a beam search, picks out-edges via C6, and installs them
//! bidirectionally through C4 — including the "over-linking" step where
//! every beam-search candidate (not just the chosen links) gets a chance
//! to add the new node as one of *its* out-edges too.

use rand::RngCore;

use super::graph::{HnswIndex, NodeKey};
use crate::error::HnswError;
use crate::metric::{check_dims, Metric, Scalar};

const HEIGHT_SCALE_THRESHOLD: u64 = 1 << 20;

fn invariant(what: &str) -> HnswError {
    HnswError::InternalInvariantViolation(what.to_string())
}

impl<D: Metric> HnswIndex<D> {
    /// Inserts `vector` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`HnswError::DuplicateKey`] if `key` is already present, or
    /// [`HnswError::DimensionMismatch`] if `vector`'s length doesn't match
    /// the dimensionality of vectors already in the index.
    pub fn insert(&mut self, key: NodeKey, vector: Vec<Scalar>) -> Result<(), HnswError> {
        if self.store.contains_key(key) {
            return Err(HnswError::DuplicateKey);
        }
        if let Some((_, existing)) = self.store.iter().next() {
            check_dims(&vector, existing.vector())?;
        }

        let height = self.random_height();
        let node = self.make_node(vector.clone(), height);
        self.store.insert(key, node);

        if self.store.len() == 1 {
            self.levels.register(height, key);
            return Ok(());
        }

        let mut start = self
            .levels
            .entry_point()
            .ok_or_else(|| invariant("insert: no entry point despite a non-empty store"))?;
        let top_height = self
            .store
            .get(start)
            .ok_or_else(|| invariant("insert: entry point not in store"))?
            .height();

        for layer in (0..top_height).rev() {
            start = self.greedy_descent(&vector, layer, start)?;

            if layer < height {
                let width = self.options.ef_construction;
                let mut candidates = self.search_level(&vector, width, layer, [start])?;
                candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

                self.set_links(key, layer, &candidates)?;

                // Over-linking: every candidate the beam search surfaced,
                // not just the ones `set_links` kept, gets a shot at
                // linking back to the new node.
                for &(peer, distance) in &candidates {
                    self.try_add_link(peer, layer, key, distance)?;
                }
            }
        }

        self.levels.register(height, key);
        Ok(())
    }

    /// Draws this insert's node height (spec §4.7).
    ///
    /// Uses exactly one raw draw from the index's RNG. If the raw range
    /// exceeds 2^20, both the sample and the range are divided down by the
    /// same integer factor before converting to a float, so that the
    /// number of raw draws per insert — and therefore the resulting
    /// sequence of heights for a fixed seed — does not depend on which
    /// RNG backend is plugged in behind `Metric`-independent callers.
    fn random_height(&mut self) -> usize {
        let mut sample = self.rng.next_u32() as u64;
        let mut range = u32::MAX as u64;

        if range > HEIGHT_SCALE_THRESHOLD {
            let divisor = range / HEIGHT_SCALE_THRESHOLD;
            sample /= divisor;
            range /= divisor;
        }

        // U is uniform on (0, 1], never exactly 0, so -ln(U) is finite.
        let u = (sample as f64 + 1.0) / (range as f64 + 1.0);
        let base = (self.options.max_links + 1) as f64;
        (-u.ln() / base.ln()).floor() as usize + 1
    }
}
