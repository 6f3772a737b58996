//! Infrastructure services

mod eviction;
mod semantic_cache_service;

pub use eviction::{EvictionManager, SweeperHandle};
pub use semantic_cache_service::{
    Answer, AnswerSource, CacheHit, CacheLookup, CacheStats, SemanticCacheBuilder,
    SemanticCacheService, StoreRequest,
};
