//! Graph search kernel (C5): greedy descent and layer-local beam search.
//!
//! Both primitives are pure with respect to the index's data — neither
//! mutates nodes, levels, or link tables, so `search` is safely callable
//! from multiple readers under an external shared-lock discipline (§5).

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use super::graph::{HnswIndex, NodeKey};
use crate::error::HnswError;
use crate::metric::{Metric, Scalar};

/// A node paired with its distance to the current query, ordered by
/// distance so it can sit directly in a [`BinaryHeap`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub distance: Scalar,
    pub key: NodeKey,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.key == other.key
    }
}
impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance.total_cmp(&other.distance)
    }
}

/// One `(key, distance)` pair as returned to callers of `search`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// The matching node's internal key.
    pub key: NodeKey,
    /// Its distance to the query vector.
    pub distance: Scalar,
}

impl<D: Metric> HnswIndex<D> {
    /// Finds up to `nearest_neighbors` entries closest to `target`, using
    /// the default beam width `100 + nearest_neighbors` (spec §4.9).
    ///
    /// # Errors
    ///
    /// Returns [`HnswError::DimensionMismatch`] if `target`'s length
    /// doesn't match the dimensionality of the index's vectors.
    pub fn search(
        &self,
        target: &[Scalar],
        nearest_neighbors: usize,
    ) -> Result<Vec<SearchResult>, HnswError> {
        self.search_with_ef(target, nearest_neighbors, 100 + nearest_neighbors)
    }

    /// Finds up to `nearest_neighbors` entries closest to `target`.
    ///
    /// `ef` is the beam width used at layer 0 (widened to
    /// `max(nearest_neighbors, ef)`); wider beams trade search time for
    /// recall. Returns entries sorted by ascending distance. An empty
    /// index returns an empty vector rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`HnswError::DimensionMismatch`] if `target`'s length
    /// doesn't match the dimensionality of the index's vectors.
    pub fn search_with_ef(
        &self,
        target: &[Scalar],
        nearest_neighbors: usize,
        ef: usize,
    ) -> Result<Vec<SearchResult>, HnswError> {
        let Some(entry) = self.levels.entry_point() else {
            return Ok(Vec::new());
        };

        let top_height = self
            .store
            .get(entry)
            .expect("search: entry point must be live")
            .height();

        let mut start = entry;
        for layer in (0..top_height).rev() {
            start = self.greedy_descent(target, layer, start)?;
        }

        let width = nearest_neighbors.max(ef);
        let mut results = self.search_level(target, width, 0, [start])?;
        results.sort_by(|a, b| a.1.total_cmp(&b.1));
        results.truncate(nearest_neighbors.min(results.len()));
        Ok(results
            .into_iter()
            .map(|(key, distance)| SearchResult { key, distance })
            .collect())
    }

    /// Greedy descent on a single layer (spec §4.5).
    ///
    /// Repeatedly moves to the neighbor of the current best node with the
    /// smallest distance to `target`, among that node's layer-`layer`
    /// out-edges, stopping once no neighbor improves on the current best.
    /// Hops are capped at the node count as a safety belt against
    /// pathological graphs.
    pub(crate) fn greedy_descent(
        &self,
        target: &[Scalar],
        layer: usize,
        start: NodeKey,
    ) -> Result<NodeKey, HnswError> {
        let mut current = start;
        let mut current_distance = self.distance(
            target,
            self.store
                .get(current)
                .expect("greedy_descent: start key must be live")
                .vector(),
        )?;

        let hop_cap = self.store.len();
        for _ in 0..hop_cap {
            let node = self
                .store
                .get(current)
                .expect("greedy_descent: current key must be live");
            if layer >= node.layers.len() {
                break;
            }

            let mut best = current;
            let mut best_distance = current_distance;
            for peer in node.layers[layer].outgoing.keys() {
                let peer_vector = self
                    .store
                    .get(peer)
                    .expect("greedy_descent: outgoing peer must be live")
                    .vector();
                let d = self.distance(target, peer_vector)?;
                if d < best_distance {
                    best = peer;
                    best_distance = d;
                }
            }

            if best == current {
                break;
            }
            current = best;
            current_distance = best_distance;
        }

        Ok(current)
    }

    /// Layer-local beam search (spec §4.5 `search_level`).
    ///
    /// Returns up to `width` closest candidates reachable from `starts` on
    /// `layer`, as `(key, distance)` pairs in unspecified order — callers
    /// sort if they need ascending order.
    pub(crate) fn search_level(
        &self,
        target: &[Scalar],
        width: usize,
        layer: usize,
        starts: impl IntoIterator<Item = NodeKey>,
    ) -> Result<Vec<(NodeKey, Scalar)>, HnswError> {
        let mut visited: HashSet<NodeKey> = HashSet::new();
        let mut results: BinaryHeap<Candidate> = BinaryHeap::new();
        let mut frontier: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();

        for start in starts {
            if !visited.insert(start) {
                continue;
            }
            let vector = self
                .store
                .get(start)
                .expect("search_level: start key must be live")
                .vector();
            let d = self.distance(target, vector)?;
            results.push(Candidate {
                distance: d,
                key: start,
            });
            frontier.push(Reverse(Candidate {
                distance: d,
                key: start,
            }));
        }

        while results.len() > width {
            results.pop();
        }

        let hop_cap = self.store.len();
        let mut hops = 0;
        while let Some(Reverse(top)) = frontier.peek().copied() {
            if hops >= hop_cap {
                log::warn!(
                    "search_level: hop cap of {hop_cap} reached on layer {layer} before the \
                     frontier drained; returning whatever was collected so far"
                );
                break;
            }
            if results.len() >= width {
                if let Some(farthest) = results.peek() {
                    if top.distance > farthest.distance {
                        break;
                    }
                }
            }
            hops += 1;
            frontier.pop();

            let node = self
                .store
                .get(top.key)
                .expect("search_level: frontier key must be live");
            if layer >= node.layers.len() {
                continue;
            }

            for peer in node.layers[layer].outgoing.keys() {
                if !visited.insert(peer) {
                    continue;
                }
                let peer_vector = self
                    .store
                    .get(peer)
                    .expect("search_level: outgoing peer must be live")
                    .vector();
                let d = self.distance(target, peer_vector)?;

                if results.len() < width {
                    results.push(Candidate { distance: d, key: peer });
                    frontier.push(Reverse(Candidate { distance: d, key: peer }));
                } else if let Some(farthest) = results.peek().copied() {
                    if d < farthest.distance {
                        results.pop();
                        results.push(Candidate { distance: d, key: peer });
                        frontier.push(Reverse(Candidate { distance: d, key: peer }));
                    }
                }
            }

            // Drop frontier entries that are now farther than anything we'd
            // still accept into results — a pure performance optimization
            // that narrows the heap without changing which nodes end up in
            // `results` (spec §4.5).
            if let Some(farthest) = results.peek().copied() {
                if results.len() >= width {
                    let kept: Vec<Reverse<Candidate>> = frontier
                        .drain()
                        .filter(|Reverse(c)| c.distance <= farthest.distance)
                        .collect();
                    frontier = BinaryHeap::from(kept);
                }
            }
        }

        Ok(results.into_iter().map(|c| (c.key, c.distance)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::config::IndexOptions;
    use crate::metric::CosineDistance;

    fn line_index(n: usize) -> HnswIndex<CosineDistance> {
        // Build a trivial chain 0 - 1 - 2 - ... - (n-1) on layer 0, with
        // vectors strung along a line so distance correlates with index
        // difference.
        let mut index: HnswIndex<CosineDistance> =
            HnswIndex::new(IndexOptions::default(), 0).unwrap();
        for i in 0..n {
            let angle = (i as f32) * 0.01;
            let node = index.make_node(vec![angle.cos(), angle.sin()], 1);
            index.store.insert(NodeKey(i as u32), node);
        }
        for i in 0..n {
            let mut neighbors = Vec::new();
            if i > 0 {
                neighbors.push(i - 1);
            }
            if i + 1 < n {
                neighbors.push(i + 1);
            }
            for &j in &neighbors {
                let dist = index
                    .distance(
                        index.store.get(NodeKey(i as u32)).unwrap().vector(),
                        index.store.get(NodeKey(j as u32)).unwrap().vector(),
                    )
                    .unwrap();
                index
                    .store
                    .get_mut(NodeKey(i as u32))
                    .unwrap()
                    .layers[0]
                    .outgoing
                    .insert(NodeKey(j as u32), dist);
            }
        }
        index
    }

    #[test]
    fn greedy_descent_reaches_nearest_point_on_chain() {
        let index = line_index(20);
        let target_angle = 0.15_f32;
        let target = vec![target_angle.cos(), target_angle.sin()];
        let result = index.greedy_descent(&target, 0, NodeKey(0)).unwrap();
        // angle 0.15 rad corresponds to index 15 along the chain (0.01 per step).
        assert_eq!(result, NodeKey(15));
    }

    #[test]
    fn search_level_respects_width() {
        let index = line_index(20);
        let target = vec![1.0_f32, 0.0];
        let results = index
            .search_level(&target, 5, 0, [NodeKey(0)])
            .unwrap();
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn search_level_on_singleton_returns_seed() {
        let mut index: HnswIndex<CosineDistance> =
            HnswIndex::new(IndexOptions::default(), 0).unwrap();
        let node = index.make_node(vec![1.0, 0.0], 1);
        index.store.insert(NodeKey(0), node);
        let results = index
            .search_level(&[1.0, 0.0], 10, 0, [NodeKey(0)])
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, NodeKey(0));
    }

    #[test]
    fn search_defaults_ef_to_one_hundred_plus_n() {
        let index = line_index(20);
        let target = vec![1.0_f32, 0.0];
        let default_ef = index.search(&target, 5).unwrap();
        let explicit_ef = index.search_with_ef(&target, 5, 105).unwrap();
        assert_eq!(default_ef, explicit_ef);
    }
}
