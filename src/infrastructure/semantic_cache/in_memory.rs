//! In-memory entry store implementation

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::domain::semantic_cache::{
    CacheLayout, Entry, EntryId, EntryStore, EntryStream, NewEntry,
};
use crate::domain::CacheError;

#[derive(Debug, Default)]
struct StoreState {
    entries: BTreeMap<EntryId, Entry>,
    layout: Option<CacheLayout>,
}

/// In-memory entry store
///
/// Suitable for single-process deployments and tests. Entries live as long as
/// the process does.
#[derive(Debug)]
pub struct InMemoryEntryStore {
    state: Arc<RwLock<StoreState>>,
    next_id: AtomicU64,
}

impl InMemoryEntryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            next_id: AtomicU64::new(1),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, CacheError> {
        self.state
            .read()
            .map_err(|e| CacheError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, CacheError> {
        self.state
            .write()
            .map_err(|e| CacheError::internal(format!("Failed to acquire write lock: {}", e)))
    }
}

impl Default for InMemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn fetch(state: &RwLock<StoreState>, id: EntryId) -> Option<Result<Entry, CacheError>> {
    match state.read() {
        Ok(state) => state.entries.get(&id).cloned().map(Ok),
        Err(e) => Some(Err(CacheError::internal(format!(
            "Failed to acquire read lock: {}",
            e
        )))),
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn insert(&self, entry: NewEntry) -> Result<Entry, CacheError> {
        let id = EntryId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Entry::from_new(id, entry);

        self.write()?.entries.insert(id, entry.clone());

        Ok(entry)
    }

    async fn get(&self, id: EntryId) -> Result<Option<Entry>, CacheError> {
        Ok(self.read()?.entries.get(&id).cloned())
    }

    async fn delete(&self, id: EntryId) -> Result<bool, CacheError> {
        Ok(self.write()?.entries.remove(&id).is_some())
    }

    fn iterate(&self) -> EntryStream {
        let ids: Vec<EntryId> = match self.read() {
            Ok(state) => state.entries.keys().copied().collect(),
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };

        let state = Arc::clone(&self.state);

        // Entries deleted after the snapshot are skipped
        stream::iter(ids)
            .filter_map(move |id| futures::future::ready(fetch(&state, id)))
            .boxed()
    }

    async fn len(&self) -> Result<usize, CacheError> {
        Ok(self.read()?.entries.len())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.write()?.entries.clear();
        Ok(())
    }

    async fn load_layout(&self) -> Result<Option<CacheLayout>, CacheError> {
        Ok(self.read()?.layout)
    }

    async fn save_layout(&self, layout: CacheLayout) -> Result<(), CacheError> {
        self.write()?.layout = Some(layout);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::semantic_cache::Fingerprint;
    use crate::domain::DistanceMetric;
    use chrono::Utc;
    use futures::TryStreamExt;

    fn new_entry(text: &str, vector: Vec<f32>) -> NewEntry {
        NewEntry {
            fingerprint: Fingerprint::new(vector, text),
            response: format!("response for {}", text),
            metadata: None,
            created_at: Utc::now(),
            ttl: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryEntryStore::new();

        let entry = store.insert(new_entry("hello", vec![0.1, 0.2])).await.unwrap();
        let retrieved = store.get(entry.id()).await.unwrap();

        assert_eq!(retrieved, Some(entry));
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_never_reused() {
        let store = InMemoryEntryStore::new();

        let first = store.insert(new_entry("a", vec![1.0])).await.unwrap();
        store.delete(first.id()).await.unwrap();
        store.clear().await.unwrap();
        let second = store.insert(new_entry("a", vec![1.0])).await.unwrap();

        assert_ne!(first.id(), second.id());
        assert!(second.id() > first.id());
    }

    #[tokio::test]
    async fn test_delete_is_noop_when_absent() {
        let store = InMemoryEntryStore::new();
        let entry = store.insert(new_entry("a", vec![1.0])).await.unwrap();

        assert!(store.delete(entry.id()).await.unwrap());
        assert!(!store.delete(entry.id()).await.unwrap());
        assert!(store.get(entry.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_iterate_is_restartable() {
        let store = InMemoryEntryStore::new();
        for text in ["a", "b", "c"] {
            store.insert(new_entry(text, vec![1.0])).await.unwrap();
        }

        let first: Vec<Entry> = store.iterate().try_collect().await.unwrap();
        let second: Vec<Entry> = store.iterate().try_collect().await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(first[0].prompt(), "a");
    }

    #[tokio::test]
    async fn test_iterate_skips_entries_deleted_mid_scan() {
        let store = InMemoryEntryStore::new();
        let a = store.insert(new_entry("a", vec![1.0])).await.unwrap();
        let b = store.insert(new_entry("b", vec![1.0])).await.unwrap();

        let stream = store.iterate();
        store.delete(b.id()).await.unwrap();
        let seen: Vec<Entry> = stream.try_collect().await.unwrap();

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id(), a.id());
    }

    #[tokio::test]
    async fn test_len_and_clear() {
        let store = InMemoryEntryStore::new();
        store.insert(new_entry("a", vec![1.0])).await.unwrap();
        store.insert(new_entry("b", vec![1.0])).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 2);

        store.clear().await.unwrap();

        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_layout_round_trip() {
        let store = InMemoryEntryStore::new();
        assert!(store.load_layout().await.unwrap().is_none());

        let layout = CacheLayout {
            dimension: 768,
            metric: DistanceMetric::Cosine,
        };
        store.save_layout(layout).await.unwrap();

        assert_eq!(store.load_layout().await.unwrap(), Some(layout));
    }
}
