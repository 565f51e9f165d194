//! Remove coordinator (C8).
//!
//! Severs every link touching the removed node, then — unless the caller
//! configured `RemoveMethod::NoLink` — gives each orphaned former incoming
//! peer a chance to adopt one of the removed node's own out-edges as a
//! replacement, chosen by the same nearest/diverse policy C6 uses at
//! insert time.

use super::graph::{HnswIndex, NodeKey};
use crate::error::HnswError;
use crate::metric::Metric;

use super::config::{InsertMethod, RemoveMethod};

fn invariant(what: &str) -> HnswError {
    HnswError::InternalInvariantViolation(what.to_string())
}

impl<D: Metric> HnswIndex<D> {
    /// Removes `key` if present. A no-op if it is not.
    ///
    /// # Errors
    ///
    /// Returns [`HnswError::InternalInvariantViolation`] if the graph's own
    /// bookkeeping (level directory, link symmetry) is found to be
    /// inconsistent while removing — this should never happen in a
    /// correctly operated index.
    pub fn remove(&mut self, key: NodeKey) -> Result<(), HnswError> {
        let height = match self.store.get(key) {
            Some(node) => node.height(),
            None => return Ok(()),
        };

        // Snapshot the removed node's per-layer link sets before touching
        // anything else, since we sever them as we go.
        let layer_links: Vec<(Vec<NodeKey>, Vec<NodeKey>)> = (0..height)
            .map(|layer| {
                let node = self.store.get(key).expect("remove: node still live");
                let outgoing: Vec<NodeKey> = node.layers[layer].outgoing.keys().collect();
                let incoming: Vec<NodeKey> = node.layers[layer].incoming.iter().collect();
                (outgoing, incoming)
            })
            .collect();

        for (layer, (outgoing, incoming)) in layer_links.iter().enumerate() {
            for &peer in outgoing {
                if let Some(peer_node) = self.store.get_mut(peer) {
                    peer_node.layers[layer].incoming.remove(key);
                }
            }
            for &peer in incoming {
                if let Some(peer_node) = self.store.get_mut(peer) {
                    peer_node.layers[layer].outgoing.remove(key);
                }
            }
        }

        if self.options.remove_method != RemoveMethod::NoLink {
            for (layer, (removed_outgoing, removed_incoming)) in layer_links.iter().enumerate() {
                for &incoming_peer in removed_incoming {
                    let existing_links: Vec<NodeKey> = self
                        .store
                        .get(incoming_peer)
                        .ok_or_else(|| invariant("remove: incoming peer vanished"))?
                        .layers[layer]
                        .outgoing
                        .keys()
                        .collect();

                    let chosen = match self.options.insert_method {
                        InsertMethod::LinkNearest => {
                            self.select_nearest_link(incoming_peer, &existing_links, removed_outgoing)?
                        }
                        InsertMethod::LinkDiverse => self.select_most_diverse_link(
                            incoming_peer,
                            &existing_links,
                            removed_outgoing,
                        )?,
                        InsertMethod::Unknown => {
                            return Err(invariant("remove: unresolved insert method"))
                        }
                    };

                    if let Some(new_link) = chosen {
                        let incoming_peer_vector = self
                            .store
                            .get(incoming_peer)
                            .ok_or_else(|| invariant("remove: incoming peer vanished"))?
                            .vector()
                            .to_vec();
                        let new_link_vector = self
                            .store
                            .get(new_link)
                            .ok_or_else(|| invariant("remove: replacement link vanished"))?
                            .vector()
                            .to_vec();
                        let d = self.distance(&incoming_peer_vector, &new_link_vector)?;

                        self.store
                            .get_mut(incoming_peer)
                            .ok_or_else(|| invariant("remove: incoming peer vanished"))?
                            .layers[layer]
                            .outgoing
                            .insert(new_link, d);
                        self.store
                            .get_mut(new_link)
                            .ok_or_else(|| invariant("remove: replacement link vanished"))?
                            .layers[layer]
                            .incoming
                            .insert(incoming_peer);

                        self.try_add_link(new_link, layer, incoming_peer, d)?;
                    }
                }
            }
        }

        self.levels.unregister(height, key);
        self.store.remove(key);
        Ok(())
    }
}
