//! Semantic cache domain models and traits
//!
//! Provides vector-based caching that matches semantically similar queries
//! rather than requiring exact key matches.

mod config;
mod entry;
mod fingerprint;
mod index;
mod store;

pub use config::{check_ttl, CacheConfiguration, CacheLayout};
pub use entry::{Entry, EntryId, NewEntry};
pub use fingerprint::Fingerprint;
pub use index::{Neighbor, SimilarityIndex};
pub use store::{EntryStore, EntryStream};

#[cfg(test)]
pub use store::MockEntryStore;
