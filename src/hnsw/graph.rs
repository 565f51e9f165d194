//! Core graph types and the `HnswIndex` struct itself.
//!
//! This module owns the data model from spec §3: nodes, their per-layer
//! link tables, and the index that wires the node store (C2), level
//! directory (C3) and caller-chosen metric together. The algorithms that
//! operate on this data — insert, remove, search, check — live in their
//! own modules as `impl HnswIndex` blocks, mirroring how the rest of this
//! crate is laid out.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::config::IndexOptions;
use super::levels::LevelDirectory;
use super::links::{IncomingLinks, OutgoingLinks};
use super::store::NodeStore;
use crate::error::HnswError;
use crate::metric::{Metric, Scalar};

/// Internal key identifying a node within the graph (§3 "Internal key").
///
/// Unique for the node's lifetime; a key is only reusable after its node
/// has been removed — this crate never reuses one itself, but the key
/// mapper collaborator (§6) may draw a freed value again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(pub u32);

/// One graph layer's link tables for a single node.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    /// Peer → distance, sorted by peer key.
    pub(crate) outgoing: OutgoingLinks,
    /// Peers that list this node in their outgoing table on this layer.
    pub(crate) incoming: IncomingLinks,
}

impl Layer {
    fn with_capacity(max_links: usize) -> Self {
        Self {
            outgoing: OutgoingLinks::with_capacity(max_links),
            incoming: IncomingLinks::with_capacity(max_links),
        }
    }
}

/// A single node: an immutable vector plus mutable per-layer link tables.
///
/// Height is `layers.len()`, always ≥ 1 — layer 0 is the base layer every
/// node participates in.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) vector: Vec<Scalar>,
    pub(crate) layers: Vec<Layer>,
}

impl Node {
    /// The node's height: how many layers it occupies.
    pub fn height(&self) -> usize {
        self.layers.len()
    }

    /// The node's stored vector.
    pub fn vector(&self) -> &[Scalar] {
        &self.vector
    }
}

/// An in-memory approximate nearest-neighbor index over an HNSW graph.
///
/// Single-writer: inserts and removes require exclusive access; `search`
/// and `check` are pure with respect to the index's data and may be called
/// concurrently by readers under an external reader-writer lock, but this
/// type itself does no internal synchronization (§5).
pub struct HnswIndex<D: Metric = crate::metric::CosineDistance> {
    pub(crate) options: IndexOptions,
    pub(crate) metric: D,
    pub(crate) store: NodeStore,
    pub(crate) levels: LevelDirectory,
    pub(crate) rng: ChaCha8Rng,
}

impl<D: Metric> HnswIndex<D> {
    /// Creates an empty index, seeded explicitly for reproducible inserts.
    ///
    /// # Errors
    ///
    /// Returns [`HnswError::UnknownOption`] if `options` carries an
    /// unrecognized enum value.
    pub fn new(options: IndexOptions, seed: u64) -> Result<Self, HnswError> {
        options.validate()?;
        Ok(Self {
            options,
            metric: D::default(),
            store: NodeStore::new(),
            levels: LevelDirectory::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Creates an empty index seeded from OS entropy, for callers who don't
    /// need bit-reproducible insert sequences.
    ///
    /// # Errors
    ///
    /// Returns [`HnswError::UnknownOption`] under the same conditions as
    /// [`HnswIndex::new`].
    pub fn new_from_entropy(options: IndexOptions) -> Result<Self, HnswError> {
        options.validate()?;
        Ok(Self {
            options,
            metric: D::default(),
            store: NodeStore::new(),
            levels: LevelDirectory::new(),
            rng: ChaCha8Rng::from_entropy(),
        })
    }

    /// Number of live nodes.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// True if the index holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// True if `key` names a live node.
    pub fn contains(&self, key: NodeKey) -> bool {
        self.store.contains_key(key)
    }

    /// The configuration this index was constructed with.
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Looks up a node for introspection (tests, diagnostics). Not part
    /// of the core algorithms, which go through the internal store
    /// directly.
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.store.get(key)
    }

    /// Iterates every live `(key, node)` pair in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.store.iter()
    }

    /// Out-edge keys for `key` on `layer`, or an empty vector if `key` is
    /// absent or doesn't reach that layer.
    pub fn outgoing_keys(&self, key: NodeKey, layer: usize) -> Vec<NodeKey> {
        self.store
            .get(key)
            .and_then(|node| node.layers.get(layer))
            .map(|l| l.outgoing.keys().collect())
            .unwrap_or_default()
    }

    /// Any one key from the tallest non-empty level bucket, or `None` if
    /// the index is empty.
    pub fn entry_point(&self) -> Option<NodeKey> {
        self.levels.entry_point()
    }

    pub(crate) fn max_links_at(&self, layer: usize) -> usize {
        self.options.max_links_at(layer)
    }

    pub(crate) fn distance(&self, a: &[Scalar], b: &[Scalar]) -> Result<Scalar, HnswError> {
        self.metric.distance(a, b)
    }

    fn new_layer_vec(&self, height: usize) -> Vec<Layer> {
        (0..height)
            .map(|layer| Layer::with_capacity(self.max_links_at(layer)))
            .collect()
    }

    pub(crate) fn make_node(&self, vector: Vec<Scalar>, height: usize) -> Node {
        Node {
            layers: self.new_layer_vec(height),
            vector,
        }
    }
}
