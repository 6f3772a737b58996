//! semcache
//!
//! A semantic response cache for LLM-backed services:
//! - Lookup by embedding distance rather than exact text
//! - Pluggable entry stores and similarity indexes
//! - TTL expiry and FIFO capacity eviction
//! - Self-healing when the index and the store drift apart

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{
    CacheConfiguration, CacheError, Clock, DistanceMetric, Embedder, Entry, EntryId, EntryStore,
    ResponseGenerator, SimilarityIndex,
};
pub use infrastructure::embedding::OffloadedEmbedder;
pub use infrastructure::semantic_cache::{FlatIndex, InMemoryEntryStore};
pub use infrastructure::services::{
    Answer, AnswerSource, CacheHit, CacheLookup, CacheStats, EvictionManager,
    SemanticCacheBuilder, SemanticCacheService, StoreRequest, SweeperHandle,
};
