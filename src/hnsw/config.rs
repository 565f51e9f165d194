//! Index configuration (part of the immutable §3 "Index options").

use serde::{Deserialize, Serialize};

use crate::error::HnswError;

/// How out-edges are chosen during insert and delete-time repair (C6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertMethod {
    /// Keep the `max_links` candidates with the smallest distance.
    LinkNearest,
    /// Relative-Neighborhood-Graph-style diversity heuristic.
    LinkDiverse,
    /// An enum value this crate does not recognize. Only ever produced by
    /// deserializing a config written by a newer or different version;
    /// surfaced as [`HnswError::UnknownOption`] at construction.
    #[serde(other)]
    Unknown,
}

impl Default for InsertMethod {
    fn default() -> Self {
        InsertMethod::LinkDiverse
    }
}

/// Whether orphaned in-edges are repaired when a node is removed (C8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoveMethod {
    /// Sever links and do nothing further.
    NoLink,
    /// Re-link a former incoming peer to a replacement chosen by C6.
    CompensateIncomingLinks,
    /// See [`InsertMethod::Unknown`].
    #[serde(other)]
    Unknown,
}

impl Default for RemoveMethod {
    fn default() -> Self {
        RemoveMethod::CompensateIncomingLinks
    }
}

/// Immutable configuration for an [`crate::hnsw::HnswIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Target out-degree on layers ≥ 1 (layer 0 uses `2 * max_links`).
    pub max_links: usize,
    /// Beam width used while inserting.
    pub ef_construction: usize,
    /// Link-selection policy.
    pub insert_method: InsertMethod,
    /// Delete-time repair policy.
    pub remove_method: RemoveMethod,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_links: 32,
            ef_construction: 200,
            insert_method: InsertMethod::default(),
            remove_method: RemoveMethod::default(),
        }
    }
}

impl IndexOptions {
    /// Validates that every enum field is one this crate recognizes.
    ///
    /// # Errors
    ///
    /// Returns [`HnswError::UnknownOption`] if `insert_method` or
    /// `remove_method` is the `Unknown` sentinel variant.
    pub(crate) fn validate(&self) -> Result<(), HnswError> {
        if matches!(self.insert_method, InsertMethod::Unknown) {
            return Err(HnswError::UnknownOption("insert_method".to_string()));
        }
        if matches!(self.remove_method, RemoveMethod::Unknown) {
            return Err(HnswError::UnknownOption("remove_method".to_string()));
        }
        Ok(())
    }

    /// Degree bound for a given layer: `2 * max_links` at layer 0, else
    /// `max_links` (§3 invariant 5).
    #[must_use]
    pub fn max_links_at(&self, layer: usize) -> usize {
        if layer == 0 {
            2 * self.max_links
        } else {
            self.max_links
        }
    }
}
