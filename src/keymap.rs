//! Opaque key mapper (C10).
//!
//! Wraps an [`HnswIndex`] so callers can use whatever key type they like
//! (strings, UUIDs, database row ids) instead of the engine's own compact
//! internal keys. Maintains a bijection between caller keys and internal
//! keys; internal keys are allocated by a uniform random draw with linear
//! probing on collision, independent of the wrapped index's own RNG.

use std::collections::HashMap;
use std::hash::Hash;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::HnswError;
use crate::hnsw::{HnswIndex, IndexOptions, NodeKey};
use crate::metric::{CosineDistance, Metric, Scalar};

/// One `(caller key, distance)` pair, translated back from an internal
/// search result.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedSearchResult<K> {
    pub key: K,
    pub distance: Scalar,
}

/// An [`HnswIndex`] addressed by caller-chosen keys instead of
/// [`NodeKey`].
pub struct KeyIndex<K, D: Metric = CosineDistance> {
    index: HnswIndex<D>,
    rng: ChaCha8Rng,
    key_to_internal: HashMap<K, NodeKey>,
    internal_to_key: HashMap<NodeKey, K>,
}

impl<K, D> KeyIndex<K, D>
where
    K: Eq + Hash + Clone,
    D: Metric,
{
    /// Creates an empty key-mapped index.
    ///
    /// `index_seed` and `key_seed` are independent: the former drives the
    /// wrapped index's node heights, the latter drives internal-key
    /// allocation. Keeping them separate means changing one doesn't
    /// perturb the other's determinism.
    pub fn new(options: IndexOptions, index_seed: u64, key_seed: u64) -> Result<Self, HnswError> {
        Ok(Self {
            index: HnswIndex::new(options, index_seed)?,
            rng: ChaCha8Rng::seed_from_u64(key_seed),
            key_to_internal: HashMap::new(),
            internal_to_key: HashMap::new(),
        })
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        self.index.size()
    }

    /// Inserts `vector` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`HnswError::DuplicateKey`] if `key` is already present.
    pub fn insert(&mut self, key: K, vector: Vec<Scalar>) -> Result<(), HnswError> {
        if self.key_to_internal.contains_key(&key) {
            return Err(HnswError::DuplicateKey);
        }

        let internal_key = self.allocate_internal_key();
        self.index.insert(internal_key, vector)?;
        self.internal_to_key.insert(internal_key, key.clone());
        self.key_to_internal.insert(key, internal_key);
        Ok(())
    }

    /// Removes `key` if present. A no-op if it is not.
    pub fn remove(&mut self, key: &K) -> Result<(), HnswError> {
        let Some(internal_key) = self.key_to_internal.remove(key) else {
            return Ok(());
        };
        self.internal_to_key.remove(&internal_key);
        self.index.remove(internal_key)?;
        self.shrink_if_sparse();
        Ok(())
    }

    /// Finds up to `nearest_neighbors` closest entries to `target`, using
    /// the default beam width `100 + nearest_neighbors` (spec §4.9).
    pub fn search(
        &self,
        target: &[Scalar],
        nearest_neighbors: usize,
    ) -> Result<Vec<KeyedSearchResult<K>>, HnswError> {
        self.search_with_ef(target, nearest_neighbors, 100 + nearest_neighbors)
    }

    /// Finds up to `nearest_neighbors` closest entries to `target`, using a
    /// search beam of `ef` candidates.
    pub fn search_with_ef(
        &self,
        target: &[Scalar],
        nearest_neighbors: usize,
        ef: usize,
    ) -> Result<Vec<KeyedSearchResult<K>>, HnswError> {
        let internal_results = self.index.search_with_ef(target, nearest_neighbors, ef)?;
        Ok(internal_results
            .into_iter()
            .map(|result| KeyedSearchResult {
                key: self
                    .internal_to_key
                    .get(&result.key)
                    .expect("search result key must have a caller-key mapping")
                    .clone(),
                distance: result.distance,
            })
            .collect())
    }

    /// Verifies the wrapped index's own invariants plus the bijection
    /// between caller keys and internal keys.
    pub fn check(&self) -> Result<bool, HnswError> {
        if !self.index.check()? {
            return Ok(false);
        }

        for (key, internal_key) in &self.key_to_internal {
            match self.internal_to_key.get(internal_key) {
                Some(mapped_key) if mapped_key == key => {}
                _ => return Ok(false),
            }
        }

        for (internal_key, key) in &self.internal_to_key {
            match self.key_to_internal.get(key) {
                Some(mapped_internal) if mapped_internal == internal_key => {}
                _ => return Ok(false),
            }
            if !self.index.contains(*internal_key) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn allocate_internal_key(&mut self) -> NodeKey {
        let mut candidate = NodeKey(self.rng.next_u32());
        while self.internal_to_key.contains_key(&candidate) {
            candidate = NodeKey(candidate.0.wrapping_add(1));
        }
        candidate
    }

    fn shrink_if_sparse(&mut self) {
        const MIN_LOAD_FACTOR: f64 = 0.25;
        let capacity = self.key_to_internal.capacity();
        if capacity > 0 && (self.key_to_internal.len() as f64 / capacity as f64) < MIN_LOAD_FACTOR {
            self.key_to_internal.shrink_to_fit();
            self.internal_to_key.shrink_to_fit();
        }
    }
}
