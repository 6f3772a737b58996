//! Entry store trait

use std::fmt::Debug;

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::{CacheLayout, Entry, EntryId, NewEntry};
use crate::domain::CacheError;

#[cfg(test)]
use mockall::automock;

/// Lazy, finite stream over stored entries
pub type EntryStream = BoxStream<'static, Result<Entry, CacheError>>;

/// Durable mapping from entry id to entry.
///
/// The store owns entries exclusively and assigns their ids. Mutations are
/// serialized inside each implementation; reads may run concurrently.
/// Transport failures surface as `CacheError::BackendUnavailable`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EntryStore: Send + Sync + Debug {
    /// Persist a new entry under a freshly generated id
    async fn insert(&self, entry: NewEntry) -> Result<Entry, CacheError>;

    /// Fetch an entry by id
    async fn get(&self, id: EntryId) -> Result<Option<Entry>, CacheError>;

    /// Delete an entry; absent ids are a no-op. Returns whether it existed.
    async fn delete(&self, id: EntryId) -> Result<bool, CacheError>;

    /// Iterate all entries. Each call starts a fresh scan.
    fn iterate(&self) -> EntryStream;

    /// Number of stored entries
    async fn len(&self) -> Result<usize, CacheError>;

    /// Remove every entry. Ids keep increasing afterwards.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Layout the stored vectors were written under, if any was recorded
    async fn load_layout(&self) -> Result<Option<CacheLayout>, CacheError>;

    /// Record the layout stored vectors are written under
    async fn save_layout(&self, layout: CacheLayout) -> Result<(), CacheError>;
}
