//! Brute-force similarity index

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::semantic_cache::{EntryId, Neighbor, SimilarityIndex};
use crate::domain::{CacheError, DistanceMetric};

#[derive(Debug)]
struct Slot {
    /// Insertion sequence, used to break distance ties
    seq: u64,
    vector: Vec<f32>,
}

#[derive(Debug, Default)]
struct IndexState {
    slots: HashMap<EntryId, Slot>,
    next_seq: u64,
}

/// Similarity index using a linear scan over every stored vector
///
/// Cache sizes are bounded by capacity, so an exact O(n) scan is the
/// baseline. Results are exact and deterministic.
#[derive(Debug)]
pub struct FlatIndex {
    dimension: usize,
    metric: DistanceMetric,
    state: RwLock<IndexState>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            dimension,
            metric,
            state: RwLock::new(IndexState::default()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn check(&self, vector: &[f32]) -> Result<(), CacheError> {
        if vector.len() != self.dimension {
            return Err(CacheError::dimension_mismatch(self.dimension, vector.len()));
        }

        self.metric.validate(vector)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexState>, CacheError> {
        self.state
            .read()
            .map_err(|e| CacheError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexState>, CacheError> {
        self.state
            .write()
            .map_err(|e| CacheError::internal(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl SimilarityIndex for FlatIndex {
    async fn insert(&self, id: EntryId, vector: &[f32]) -> Result<(), CacheError> {
        self.check(vector)?;

        let mut state = self.write()?;

        // Re-inserting keeps the original position in the tie-break order
        if let Some(slot) = state.slots.get_mut(&id) {
            slot.vector = vector.to_vec();
            return Ok(());
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.slots.insert(
            id,
            Slot {
                seq,
                vector: vector.to_vec(),
            },
        );

        Ok(())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, CacheError> {
        self.check(query)?;

        let state = self.read()?;

        if k == 0 || state.slots.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = state
            .slots
            .iter()
            .map(|(id, slot)| {
                let distance = self.metric.distance(query, &slot.vector)?;
                Ok((distance, slot.seq, *id))
            })
            .collect::<Result<Vec<(f32, u64, EntryId)>, CacheError>>()?;

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, _, id)| Neighbor::new(id, distance))
            .collect())
    }

    async fn remove(&self, id: EntryId) -> Result<(), CacheError> {
        self.write()?.slots.remove(&id);
        Ok(())
    }

    async fn size(&self) -> Result<usize, CacheError> {
        Ok(self.read()?.slots.len())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.write()?.slots.clear();
        Ok(())
    }
}
