//! Per-layer link tables (C4).
//!
//! `outgoing` is a sorted flat sequence of `(peer, distance)` pairs, kept
//! sorted by peer key for binary-search membership and for the ordered
//! iteration bulk-assign relies on. At `max_links` around 32 this beats a
//! general-purpose associative container. `incoming` is a small unordered
//! vector — linear scans are cheap at this degree and it only matters for
//! delete-time repair and invariant checks.

use super::graph::NodeKey;
use crate::metric::Scalar;

/// Outgoing links for one node on one layer: peer key → distance, sorted
/// by peer key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingLinks {
    entries: Vec<(NodeKey, Scalar)>,
}

impl OutgoingLinks {
    /// Creates an empty table, reserving capacity for `max_links` entries.
    pub fn with_capacity(max_links: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_links),
        }
    }

    /// Number of out-edges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no out-edges.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(peer, distance)` pairs in ascending peer-key order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, Scalar)> + '_ {
        self.entries.iter().copied()
    }

    /// Peer keys only, in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    fn position(&self, peer: NodeKey) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&peer, |(k, _)| *k)
    }

    /// True if `peer` is already an out-edge.
    pub fn contains(&self, peer: NodeKey) -> bool {
        self.position(peer).is_ok()
    }

    /// Distance stored for `peer`, if present.
    pub fn distance_to(&self, peer: NodeKey) -> Option<Scalar> {
        self.position(peer).ok().map(|i| self.entries[i].1)
    }

    /// Inserts or overwrites the link to `peer`. Returns `true` if this was
    /// a new entry.
    pub fn insert(&mut self, peer: NodeKey, distance: Scalar) -> bool {
        match self.position(peer) {
            Ok(i) => {
                self.entries[i].1 = distance;
                false
            }
            Err(i) => {
                self.entries.insert(i, (peer, distance));
                true
            }
        }
    }

    /// Removes the link to `peer`, if present. Returns whether it was
    /// removed.
    pub fn remove(&mut self, peer: NodeKey) -> bool {
        if let Ok(i) = self.position(peer) {
            self.entries.remove(i);
            true
        } else {
            false
        }
    }

    /// Returns the current entry with the largest distance, if any.
    pub fn farthest(&self) -> Option<(NodeKey, Scalar)> {
        self.entries
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Replaces the entire table with a pre-sorted, unique sequence of
    /// `(peer, distance)` pairs sorted by peer key. The caller is
    /// responsible for the sort-and-dedup invariant; this does not
    /// re-validate it.
    pub fn assign_sorted_unique(&mut self, entries: Vec<(NodeKey, Scalar)>) {
        debug_assert!(
            entries.windows(2).all(|w| w[0].0 < w[1].0),
            "assign_sorted_unique requires strictly ascending, unique peer keys"
        );
        self.entries = entries;
    }
}

/// Incoming links for one node on one layer: the set of peers that list
/// this node in their outgoing table on the same layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingLinks {
    entries: Vec<NodeKey>,
}

impl IncomingLinks {
    /// Creates an empty set, reserving capacity for `max_links` entries.
    pub fn with_capacity(max_links: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_links),
        }
    }

    /// Number of incoming links.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no incoming links.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates incoming peer keys in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.entries.iter().copied()
    }

    /// True if `peer` is in the set.
    pub fn contains(&self, peer: NodeKey) -> bool {
        self.entries.contains(&peer)
    }

    /// Inserts `peer`. Returns `false` if it was already present.
    pub fn insert(&mut self, peer: NodeKey) -> bool {
        if self.contains(peer) {
            false
        } else {
            self.entries.push(peer);
            true
        }
    }

    /// Removes `peer`. Returns whether it was present.
    pub fn remove(&mut self, peer: NodeKey) -> bool {
        if let Some(i) = self.entries.iter().position(|&k| k == peer) {
            self.entries.swap_remove(i);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(n: u32) -> NodeKey {
        NodeKey(n)
    }

    #[test]
    fn outgoing_stays_sorted_by_key_after_inserts() {
        let mut out = OutgoingLinks::default();
        out.insert(k(5), 1.0);
        out.insert(k(1), 2.0);
        out.insert(k(3), 0.5);
        let keys: Vec<_> = out.keys().collect();
        assert_eq!(keys, vec![k(1), k(3), k(5)]);
    }

    #[test]
    fn outgoing_insert_overwrites_existing_distance() {
        let mut out = OutgoingLinks::default();
        out.insert(k(1), 2.0);
        assert!(!out.insert(k(1), 9.0));
        assert_eq!(out.distance_to(k(1)), Some(9.0));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn outgoing_farthest_picks_max_distance() {
        let mut out = OutgoingLinks::default();
        out.insert(k(1), 2.0);
        out.insert(k(2), 5.0);
        out.insert(k(3), 1.0);
        assert_eq!(out.farthest(), Some((k(2), 5.0)));
    }

    #[test]
    fn outgoing_remove_absent_is_noop() {
        let mut out = OutgoingLinks::default();
        out.insert(k(1), 1.0);
        assert!(!out.remove(k(2)));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn incoming_insert_is_idempotent() {
        let mut inc = IncomingLinks::default();
        assert!(inc.insert(k(1)));
        assert!(!inc.insert(k(1)));
        assert_eq!(inc.len(), 1);
    }

    #[test]
    fn incoming_remove_reports_presence() {
        let mut inc = IncomingLinks::default();
        inc.insert(k(1));
        assert!(inc.remove(k(1)));
        assert!(!inc.remove(k(1)));
    }
}
