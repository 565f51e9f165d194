//! Integrity auditor (C9).
//!
//! `check` walks every node and verifies the invariants from spec §3:
//! no self-links, outgoing/incoming symmetry on every layer, a peer's
//! height must exceed the layer it's linked on, and the level directory
//! must agree bijectively with every node's height. Intended for tests
//! and debugging, not the hot path — it re-derives nothing the graph
//! already tracks, it only cross-checks it.

use super::graph::HnswIndex;
use crate::error::HnswError;
use crate::metric::Metric;

impl<D: Metric> HnswIndex<D> {
    /// Returns `Ok(true)` iff every invariant holds, `Ok(false)` on the
    /// first violation found.
    pub fn check(&self) -> Result<bool, HnswError> {
        for (key, node) in self.store.iter() {
            for layer in 0..node.height() {
                for peer in node.layers[layer].outgoing.keys() {
                    if peer == key {
                        return Ok(false);
                    }
                    let Some(peer_node) = self.store.get(peer) else {
                        return Ok(false);
                    };
                    if peer_node.height() <= layer {
                        return Ok(false);
                    }
                    if !peer_node.layers[layer].incoming.contains(key) {
                        return Ok(false);
                    }
                }

                for peer in node.layers[layer].incoming.iter() {
                    if peer == key {
                        return Ok(false);
                    }
                    let Some(peer_node) = self.store.get(peer) else {
                        return Ok(false);
                    };
                    if peer_node.height() <= layer {
                        return Ok(false);
                    }
                    if !peer_node.layers[layer].outgoing.contains(key) {
                        return Ok(false);
                    }
                }
            }

            match self.levels.bucket(node.height()) {
                Some(bucket) if bucket.contains(&key) => {}
                _ => return Ok(false),
            }
        }

        for (height, bucket) in self.levels.iter() {
            for &key in bucket {
                match self.store.get(key) {
                    Some(node) if node.height() == height => {}
                    _ => return Ok(false),
                }
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::config::IndexOptions;
    use crate::hnsw::graph::NodeKey;
    use crate::metric::CosineDistance;

    fn point(angle: f32) -> Vec<crate::metric::Scalar> {
        vec![angle.cos(), angle.sin()]
    }

    #[test]
    fn empty_index_passes_check() {
        let index: HnswIndex<CosineDistance> = HnswIndex::new(IndexOptions::default(), 0).unwrap();
        assert!(index.check().unwrap());
    }

    #[test]
    fn populated_index_passes_check() {
        let mut index: HnswIndex<CosineDistance> =
            HnswIndex::new(IndexOptions::default(), 17).unwrap();
        for i in 0..50u32 {
            index.insert(NodeKey(i), point(i as f32 * 0.13)).unwrap();
        }
        assert!(index.check().unwrap());
    }

    #[test]
    fn check_survives_removals() {
        let mut index: HnswIndex<CosineDistance> =
            HnswIndex::new(IndexOptions::default(), 23).unwrap();
        for i in 0..40u32 {
            index.insert(NodeKey(i), point(i as f32 * 0.17)).unwrap();
        }
        for i in (0..40u32).step_by(3) {
            index.remove(NodeKey(i)).unwrap();
        }
        assert!(index.check().unwrap());
    }

    #[test]
    fn detects_broken_symmetry() {
        let mut index: HnswIndex<CosineDistance> =
            HnswIndex::new(IndexOptions::default(), 1).unwrap();
        for i in 0..5u32 {
            index.insert(NodeKey(i), point(i as f32 * 0.3)).unwrap();
        }
        assert!(index.check().unwrap());

        let (peer, _) = index
            .store
            .get(NodeKey(0))
            .unwrap()
            .layers[0]
            .outgoing
            .iter()
            .next()
            .expect("node 0 should have at least one out-edge among 5 nodes");

        // Sabotage: sever one side of a link, leaving the other dangling.
        index
            .store
            .get_mut(peer)
            .unwrap()
            .layers[0]
            .incoming
            .remove(NodeKey(0));

        assert!(!index.check().unwrap());
    }
}
