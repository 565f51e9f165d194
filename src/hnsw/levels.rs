//! Level directory (C3).
//!
//! An ordered map from node height to the set of keys whose tallest layer
//! is exactly that height. The top non-empty bucket names every acceptable
//! entry point for a search or an insert's descent phase — any member of
//! it will do. Same shrink-on-sparse rule as the node store (§4.3).

use std::collections::{BTreeMap, HashSet};

use super::graph::NodeKey;

const MIN_LOAD_FACTOR: f64 = 0.25;

/// Maps node height to the keys currently occupying that height.
#[derive(Debug, Default)]
pub struct LevelDirectory {
    buckets: BTreeMap<usize, HashSet<NodeKey>>,
}

impl LevelDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    /// True if no node is registered at any height.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Registers `key` at `height`. The caller must ensure `key` is not
    /// already registered at a different height (invariant 3 forbids a
    /// node appearing in more than one bucket).
    pub fn register(&mut self, height: usize, key: NodeKey) {
        self.buckets.entry(height).or_default().insert(key);
    }

    /// Removes `key` from the `height` bucket, deleting the bucket if it
    /// becomes empty and shrinking it first if it has grown sparse.
    pub fn unregister(&mut self, height: usize, key: NodeKey) {
        if let Some(bucket) = self.buckets.get_mut(&height) {
            bucket.remove(&key);
            if bucket.is_empty() {
                self.buckets.remove(&height);
            } else {
                let capacity = bucket.capacity();
                if capacity > 0 && (bucket.len() as f64 / capacity as f64) < MIN_LOAD_FACTOR {
                    bucket.shrink_to_fit();
                }
            }
        }
    }

    /// Returns any one key from the tallest non-empty bucket — an
    /// acceptable entry point for search or insert.
    pub fn entry_point(&self) -> Option<NodeKey> {
        self.buckets
            .iter()
            .next_back()
            .and_then(|(_, bucket)| bucket.iter().next().copied())
    }

    /// The bucket registered at `height`, if any.
    pub fn bucket(&self, height: usize) -> Option<&HashSet<NodeKey>> {
        self.buckets.get(&height)
    }

    /// Iterates `(height, bucket)` pairs in ascending height order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &HashSet<NodeKey>)> {
        self.buckets.iter().map(|(h, b)| (*h, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_point_comes_from_tallest_bucket() {
        let mut dirs = LevelDirectory::new();
        dirs.register(1, NodeKey(1));
        dirs.register(3, NodeKey(2));
        dirs.register(2, NodeKey(3));
        assert_eq!(dirs.entry_point(), Some(NodeKey(2)));
    }

    #[test]
    fn unregister_last_member_removes_bucket() {
        let mut dirs = LevelDirectory::new();
        dirs.register(1, NodeKey(1));
        dirs.unregister(1, NodeKey(1));
        assert!(dirs.bucket(1).is_none());
        assert!(dirs.is_empty());
    }

    #[test]
    fn unregister_nonmember_is_noop() {
        let mut dirs = LevelDirectory::new();
        dirs.register(1, NodeKey(1));
        dirs.unregister(1, NodeKey(2));
        assert!(dirs.bucket(1).unwrap().contains(&NodeKey(1)));
    }
}
