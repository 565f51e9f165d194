//! Link selection (C6): choosing which candidates become out-edges, both
//! when a node first connects to a layer and when the graph tries to
//! squeeze one more link into an already-full table.
//!
//! `insert_method` picks between two policies throughout this module:
//! nearest (keep the closest `max_links` candidates, full stop) and
//! diverse (a Relative-Neighborhood-Graph-style heuristic that rejects a
//! candidate once some already-accepted neighbor sits strictly closer to
//! it than the node being linked does). Grounded in the reference
//! `set_links` / `select_diverse_links` / `try_add_link` / `select_nearest_link`
//! / `select_most_diverse_link` quartet.

use super::config::InsertMethod;
use super::graph::{HnswIndex, Layer, NodeKey};
use crate::error::HnswError;
use crate::metric::{Metric, Scalar};

fn invariant(what: &str) -> HnswError {
    HnswError::InternalInvariantViolation(what.to_string())
}

impl<D: Metric> HnswIndex<D> {
    fn node_vector(&self, key: NodeKey) -> Result<Vec<Scalar>, HnswError> {
        Ok(self
            .store
            .get(key)
            .ok_or_else(|| invariant("node_vector: unknown key"))?
            .vector()
            .to_vec())
    }

    fn node_layer(&self, node: NodeKey, layer: usize) -> Result<&Layer, HnswError> {
        self.store
            .get(node)
            .and_then(|n| n.layers.get(layer))
            .ok_or_else(|| invariant("node_layer: missing node or layer"))
    }

    /// Sets `node`'s final out-edge set at `layer` from `candidates`, which
    /// must already be sorted ascending by distance to `node`. Replaces the
    /// table wholesale and keeps both sides of every affected link in sync.
    pub(crate) fn set_links(
        &mut self,
        node: NodeKey,
        layer: usize,
        candidates: &[(NodeKey, Scalar)],
    ) -> Result<(), HnswError> {
        let need_links = self.max_links_at(layer);

        let mut new_links: Vec<(NodeKey, Scalar)> = match self.options.insert_method {
            InsertMethod::LinkNearest => candidates.iter().take(need_links).copied().collect(),
            InsertMethod::LinkDiverse => self.select_diverse_links(need_links, candidates)?,
            InsertMethod::Unknown => {
                return Err(invariant("set_links: unresolved insert method"))
            }
        };

        let old_peers: Vec<NodeKey> = self.node_layer(node, layer)?.outgoing.keys().collect();
        for peer in old_peers {
            if let Some(peer_node) = self.store.get_mut(peer) {
                peer_node.layers[layer].incoming.remove(node);
            }
        }

        new_links.sort_by_key(|&(peer, _)| peer);
        let new_peers = new_links.clone();

        self.store
            .get_mut(node)
            .ok_or_else(|| invariant("set_links: node vanished mid-update"))?
            .layers[layer]
            .outgoing
            .assign_sorted_unique(new_links);

        for (peer, _) in new_peers {
            if let Some(peer_node) = self.store.get_mut(peer) {
                peer_node.layers[layer].incoming.insert(node);
            }
        }

        Ok(())
    }

    /// The diverse selection heuristic (RNG-style rejection).
    ///
    /// `candidates` must already be sorted ascending by distance to the
    /// node being linked. Candidates rejected for violating diversity are
    /// kept and used to pad the result back up to `quota` if fewer than
    /// `quota` candidates survive the heuristic.
    fn select_diverse_links(
        &self,
        quota: usize,
        candidates: &[(NodeKey, Scalar)],
    ) -> Result<Vec<(NodeKey, Scalar)>, HnswError> {
        let mut accepted: Vec<(NodeKey, Scalar)> = Vec::with_capacity(quota);
        let mut accepted_vectors: Vec<Vec<Scalar>> = Vec::with_capacity(quota);
        let mut rejected: Vec<(NodeKey, Scalar)> = Vec::with_capacity(quota);

        for &(peer, peer_distance) in candidates {
            if accepted.len() >= quota {
                break;
            }

            let peer_vector = self.node_vector(peer)?;
            let mut reject = false;
            for accepted_vector in &accepted_vectors {
                if self.distance(&peer_vector, accepted_vector)? < peer_distance {
                    reject = true;
                    break;
                }
            }

            if reject {
                if rejected.len() < quota {
                    rejected.push((peer, peer_distance));
                }
            } else {
                accepted.push((peer, peer_distance));
                accepted_vectors.push(peer_vector);
            }
        }

        for candidate in rejected {
            if accepted.len() >= quota {
                break;
            }
            accepted.push(candidate);
        }

        Ok(accepted)
    }

    /// Tries to add `new_link` as an out-edge of `node` on `layer`.
    ///
    /// Adds it directly if the table has room. Otherwise applies the
    /// configured replacement policy, which may bump an existing link to
    /// make room, or reject the new one outright. Keeps incoming tables on
    /// both sides consistent with whatever outgoing change (if any) is
    /// made.
    pub(crate) fn try_add_link(
        &mut self,
        node: NodeKey,
        layer: usize,
        new_link: NodeKey,
        link_distance: Scalar,
    ) -> Result<(), HnswError> {
        let max_links = self.max_links_at(layer);
        let current_len = self.node_layer(node, layer)?.outgoing.len();

        if current_len < max_links {
            return self.add_link_both_sides(node, layer, new_link, link_distance);
        }

        match self.options.insert_method {
            InsertMethod::LinkNearest => self.try_add_link_nearest(node, layer, new_link, link_distance),
            InsertMethod::LinkDiverse => self.try_add_link_diverse(node, layer, new_link, link_distance),
            InsertMethod::Unknown => Err(invariant("try_add_link: unresolved insert method")),
        }
    }

    fn try_add_link_nearest(
        &mut self,
        node: NodeKey,
        layer: usize,
        new_link: NodeKey,
        link_distance: Scalar,
    ) -> Result<(), HnswError> {
        let entries: Vec<(NodeKey, Scalar)> = self.node_layer(node, layer)?.outgoing.iter().collect();

        if entries.iter().any(|&(peer, _)| peer == new_link) {
            return Ok(());
        }

        let (farthest_key, farthest_distance) = entries
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| invariant("try_add_link_nearest: full table was empty"))?;

        if link_distance < farthest_distance {
            self.replace_link(node, layer, farthest_key, new_link, link_distance)?;
        }

        Ok(())
    }

    /// Applies the RNG replacement test to decide whether `new_link`
    /// bumps an existing out-edge.
    ///
    /// This mirrors an asymmetry present in the reference implementation:
    /// once an entry has been provisionally accepted as "no eviction here"
    /// (because `link_distance` is already at least as large as its
    /// *stored* distance), the candidate's fate is decided against a
    /// *recomputed* distance from `new_link`'s vector to that entry's
    /// vector, not the entry's own stored distance. The heuristic is kept
    /// as-is rather than "corrected" — changing it would change which
    /// links survive under `link_diverse` in ways not covered by this
    /// crate's tests.
    fn try_add_link_diverse(
        &mut self,
        node: NodeKey,
        layer: usize,
        new_link: NodeKey,
        link_distance: Scalar,
    ) -> Result<(), HnswError> {
        let mut sorted_links: Vec<(NodeKey, Scalar)> =
            self.node_layer(node, layer)?.outgoing.iter().collect();
        sorted_links.sort_by(|a, b| a.1.total_cmp(&b.1));

        let farthest_distance = sorted_links
            .last()
            .map(|&(_, d)| d)
            .ok_or_else(|| invariant("try_add_link_diverse: full table was empty"))?;
        if link_distance >= farthest_distance {
            return Ok(());
        }
        if sorted_links.iter().any(|&(peer, _)| peer == new_link) {
            return Ok(());
        }

        let new_link_vector = self.node_vector(new_link)?;
        let mut insert = true;
        let mut replace_index = sorted_links.len() - 1;

        for (i, &(peer, stored_distance)) in sorted_links.iter().enumerate() {
            let peer_vector = self.node_vector(peer)?;
            let recomputed = self.distance(&new_link_vector, &peer_vector)?;

            if link_distance >= stored_distance {
                if link_distance > recomputed {
                    insert = false;
                    break;
                }
            } else if replace_index > i && stored_distance > recomputed {
                replace_index = i;
            }
        }

        if insert {
            let (replace_key, _) = sorted_links[replace_index];
            self.replace_link(node, layer, replace_key, new_link, link_distance)?;
        }

        Ok(())
    }

    fn add_link_both_sides(
        &mut self,
        node: NodeKey,
        layer: usize,
        peer: NodeKey,
        distance: Scalar,
    ) -> Result<(), HnswError> {
        self.store
            .get_mut(node)
            .ok_or_else(|| invariant("add_link_both_sides: node vanished"))?
            .layers[layer]
            .outgoing
            .insert(peer, distance);
        self.store
            .get_mut(peer)
            .ok_or_else(|| invariant("add_link_both_sides: peer vanished"))?
            .layers[layer]
            .incoming
            .insert(node);
        Ok(())
    }

    fn replace_link(
        &mut self,
        node: NodeKey,
        layer: usize,
        old_peer: NodeKey,
        new_peer: NodeKey,
        new_distance: Scalar,
    ) -> Result<(), HnswError> {
        self.store
            .get_mut(old_peer)
            .ok_or_else(|| invariant("replace_link: old peer vanished"))?
            .layers[layer]
            .incoming
            .remove(node);
        {
            let node_mut = self
                .store
                .get_mut(node)
                .ok_or_else(|| invariant("replace_link: node vanished"))?;
            node_mut.layers[layer].outgoing.remove(old_peer);
            node_mut.layers[layer].outgoing.insert(new_peer, new_distance);
        }
        self.store
            .get_mut(new_peer)
            .ok_or_else(|| invariant("replace_link: new peer vanished"))?
            .layers[layer]
            .incoming
            .insert(node);
        Ok(())
    }

    /// Delete-time repair (spec §4.8, nearest policy): among `candidates`
    /// (the removed node's own out-edges on this layer), finds the one
    /// closest to `link_to`, skipping `link_to` itself and anything
    /// already present in `existing_links`.
    pub(crate) fn select_nearest_link(
        &self,
        link_to: NodeKey,
        existing_links: &[NodeKey],
        candidates: &[NodeKey],
    ) -> Result<Option<NodeKey>, HnswError> {
        let link_to_vector = self.node_vector(link_to)?;
        let mut best: Option<(NodeKey, Scalar)> = None;

        for &candidate in candidates {
            if candidate == link_to || existing_links.contains(&candidate) {
                continue;
            }
            let candidate_vector = self.node_vector(candidate)?;
            let d = self.distance(&candidate_vector, &link_to_vector)?;
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((candidate, d));
            }
        }

        Ok(best.map(|(key, _)| key))
    }

    /// Delete-time repair (spec §4.8, diverse policy): among `candidates`,
    /// prefers the closest one to `link_to` that no member of
    /// `existing_links` is closer to than `link_to` itself is — falling
    /// back to the single closest candidate if none qualifies.
    pub(crate) fn select_most_diverse_link(
        &self,
        link_to: NodeKey,
        existing_links: &[NodeKey],
        candidates: &[NodeKey],
    ) -> Result<Option<NodeKey>, HnswError> {
        let link_to_vector = self.node_vector(link_to)?;

        let mut filtered: Vec<(NodeKey, Scalar)> = Vec::with_capacity(candidates.len());
        for &candidate in candidates {
            if candidate == link_to || existing_links.contains(&candidate) {
                continue;
            }
            let candidate_vector = self.node_vector(candidate)?;
            let d = self.distance(&link_to_vector, &candidate_vector)?;
            filtered.push((candidate, d));
        }
        filtered.sort_by(|a, b| a.1.total_cmp(&b.1));

        for &(candidate, candidate_distance) in &filtered {
            let candidate_vector = self.node_vector(candidate)?;
            let mut good = true;
            for &existing in existing_links {
                let existing_vector = self.node_vector(existing)?;
                let d = self.distance(&existing_vector, &candidate_vector)?;
                if d < candidate_distance {
                    good = false;
                    break;
                }
            }
            if good {
                return Ok(Some(candidate));
            }
        }

        Ok(filtered.first().map(|&(key, _)| key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::config::IndexOptions;
    use crate::metric::CosineDistance;

    fn point(angle: f32) -> Vec<Scalar> {
        vec![angle.cos(), angle.sin()]
    }

    fn index_with(options: IndexOptions) -> HnswIndex<CosineDistance> {
        HnswIndex::new(options, 0).unwrap()
    }

    #[test]
    fn set_links_nearest_keeps_closest_prefix() {
        let mut options = IndexOptions::default();
        options.insert_method = InsertMethod::LinkNearest;
        options.max_links = 2;
        let mut index = index_with(options);

        let node = index.make_node(point(0.0), 1);
        index.store.insert(NodeKey(0), node);
        for (i, angle) in [0.01_f32, 0.5, 1.0].into_iter().enumerate() {
            let n = index.make_node(point(angle), 1);
            index.store.insert(NodeKey(i as u32 + 1), n);
        }

        let mut candidates = Vec::new();
        for i in 1..=3u32 {
            let d = index
                .distance(
                    index.store.get(NodeKey(0)).unwrap().vector(),
                    index.store.get(NodeKey(i)).unwrap().vector(),
                )
                .unwrap();
            candidates.push((NodeKey(i), d));
        }
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

        index.set_links(NodeKey(0), 0, &candidates).unwrap();
        let kept: Vec<NodeKey> = index
            .store
            .get(NodeKey(0))
            .unwrap()
            .layers[0]
            .outgoing
            .keys()
            .collect();
        assert_eq!(kept.len(), 2);
        assert!(kept.contains(&NodeKey(1)));
        assert!(kept.contains(&NodeKey(2)));
        assert!(!kept.contains(&NodeKey(3)));
    }

    #[test]
    fn set_links_registers_incoming_on_peers() {
        let mut options = IndexOptions::default();
        options.max_links = 4;
        let mut index = index_with(options);

        let node = index.make_node(point(0.0), 1);
        index.store.insert(NodeKey(0), node);
        let peer = index.make_node(point(0.1), 1);
        index.store.insert(NodeKey(1), peer);

        let d = index
            .distance(
                index.store.get(NodeKey(0)).unwrap().vector(),
                index.store.get(NodeKey(1)).unwrap().vector(),
            )
            .unwrap();
        index.set_links(NodeKey(0), 0, &[(NodeKey(1), d)]).unwrap();

        assert!(index
            .store
            .get(NodeKey(1))
            .unwrap()
            .layers[0]
            .incoming
            .contains(NodeKey(0)));
    }

    #[test]
    fn try_add_link_nearest_replaces_farthest_when_closer() {
        let mut options = IndexOptions::default();
        options.insert_method = InsertMethod::LinkNearest;
        options.max_links = 1;
        let mut index = index_with(options);

        let node = index.make_node(point(0.0), 1);
        index.store.insert(NodeKey(0), node);
        let far = index.make_node(point(1.5), 1);
        index.store.insert(NodeKey(1), far);
        let near = index.make_node(point(0.05), 1);
        index.store.insert(NodeKey(2), near);

        let d_far = index
            .distance(
                index.store.get(NodeKey(0)).unwrap().vector(),
                index.store.get(NodeKey(1)).unwrap().vector(),
            )
            .unwrap();
        index.set_links(NodeKey(0), 0, &[(NodeKey(1), d_far)]).unwrap();

        let d_near = index
            .distance(
                index.store.get(NodeKey(0)).unwrap().vector(),
                index.store.get(NodeKey(2)).unwrap().vector(),
            )
            .unwrap();
        index.try_add_link(NodeKey(0), 0, NodeKey(2), d_near).unwrap();

        let kept: Vec<NodeKey> = index
            .store
            .get(NodeKey(0))
            .unwrap()
            .layers[0]
            .outgoing
            .keys()
            .collect();
        assert_eq!(kept, vec![NodeKey(2)]);
        assert!(!index
            .store
            .get(NodeKey(1))
            .unwrap()
            .layers[0]
            .incoming
            .contains(NodeKey(0)));
    }

    #[test]
    fn select_nearest_link_skips_self_and_existing() {
        let mut index = index_with(IndexOptions::default());
        for i in 0..4u32 {
            let n = index.make_node(point(i as f32 * 0.2), 1);
            index.store.insert(NodeKey(i), n);
        }
        let result = index
            .select_nearest_link(NodeKey(0), &[NodeKey(1)], &[NodeKey(0), NodeKey(1), NodeKey(2), NodeKey(3)])
            .unwrap();
        assert_eq!(result, Some(NodeKey(2)));
    }
}
