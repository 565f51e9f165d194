//! An in-memory approximate nearest-neighbor index over a Hierarchical
//! Navigable Small World graph.
//!
//! The engine is single-writer: [`hnsw::HnswIndex::insert`] and
//! [`hnsw::HnswIndex::remove`] need exclusive access, while
//! [`hnsw::HnswIndex::search`] and [`hnsw::HnswIndex::check`] are pure
//! reads safe to call concurrently under an external reader-writer lock.
//! This crate does no locking of its own.
//!
//! ```
//! use hnswgraph::{HnswIndex, IndexOptions, NodeKey};
//! use hnswgraph::metric::CosineDistance;
//!
//! let mut index: HnswIndex<CosineDistance> = HnswIndex::new(IndexOptions::default(), 0)?;
//! index.insert(NodeKey(0), vec![1.0, 0.0, 0.0])?;
//! index.insert(NodeKey(1), vec![0.0, 1.0, 0.0])?;
//!
//! let results = index.search(&[0.9, 0.1, 0.0], 1)?;
//! assert_eq!(results[0].key, NodeKey(0));
//! # Ok::<(), hnswgraph::error::HnswError>(())
//! ```
//!
//! Use [`keymap::KeyIndex`] instead of `HnswIndex` directly when your
//! natural key type isn't already a compact integer.

pub mod error;
pub mod hnsw;
pub mod keymap;
pub mod metric;

pub use error::HnswError;
pub use hnsw::{HnswIndex, IndexOptions, InsertMethod, NodeKey, RemoveMethod, SearchResult};
pub use keymap::{KeyIndex, KeyedSearchResult};
