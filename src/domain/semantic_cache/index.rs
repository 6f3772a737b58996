//! Similarity index trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::EntryId;
use crate::domain::CacheError;

/// A nearest-neighbor candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: EntryId,
    pub distance: f32,
}

impl Neighbor {
    pub fn new(id: EntryId, distance: f32) -> Self {
        Self { id, distance }
    }
}

/// Nearest-neighbor search over stored fingerprint vectors.
///
/// The index only references entries by id; it never owns them. Removing an
/// entry from the store must be paired with a removal here.
#[async_trait]
pub trait SimilarityIndex: Send + Sync + Debug {
    /// Add or replace the vector stored under `id`
    async fn insert(&self, id: EntryId, vector: &[f32]) -> Result<(), CacheError>;

    /// Up to `k` nearest entries by ascending distance. Equal distances rank
    /// by insertion order, earliest first.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, CacheError>;

    /// Remove `id` if present
    async fn remove(&self, id: EntryId) -> Result<(), CacheError>;

    /// Number of indexed vectors
    async fn size(&self) -> Result<usize, CacheError>;

    /// Drop every indexed vector
    async fn clear(&self) -> Result<(), CacheError>;
}
