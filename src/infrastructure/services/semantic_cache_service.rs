//! Semantic response caching service
//!
//! Orchestrates check and store over an entry store and a similarity index.
//! Stores write the entry first and index it second, so an id is only ever
//! discoverable once its entry can be fetched. The two structures are never
//! locked together: a check that finds an id without an entry heals the index
//! and reports a miss.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::eviction::{EvictionManager, SweeperHandle};
use crate::domain::semantic_cache::{
    check_ttl, CacheConfiguration, EntryId, EntryStore, Fingerprint, NewEntry, SimilarityIndex,
};
use crate::domain::{CacheError, Clock, DistanceMetric, Embedder, ResponseGenerator, SystemClock};
use crate::infrastructure::observability::{
    record_check, record_repair, record_store, EvictionReason,
};
use crate::infrastructure::semantic_cache::{FlatIndex, InMemoryEntryStore};

/// An accepted match for a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheHit {
    pub entry_id: EntryId,
    /// The prompt the cached response was generated for
    pub prompt: String,
    pub response: String,
    pub distance: f32,
    pub metadata: Option<serde_json::Value>,
}

/// Outcome of a cache check
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CacheHit),
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn into_hit(self) -> Option<CacheHit> {
        match self {
            Self::Hit(hit) => Some(hit),
            Self::Miss => None,
        }
    }
}

/// A response to cache, with optional precomputed fingerprint vector
#[derive(Debug, Clone)]
pub struct StoreRequest {
    prompt: String,
    response: String,
    vector: Option<Vec<f32>>,
    metadata: Option<serde_json::Value>,
    ttl: Option<Duration>,
}

impl StoreRequest {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            vector: None,
            metadata: None,
            ttl: None,
        }
    }

    /// Use this vector instead of embedding the prompt
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Override the configured TTL for this entry
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Statistics for the semantic cache
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub index_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub repairs: u64,
    pub pending_repairs: usize,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;

        if total == 0 {
            return 0.0;
        }

        self.hits as f32 / total as f32
    }
}

/// Where an answer came from
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSource {
    Cache { entry_id: EntryId, distance: f32 },
    /// Freshly generated; `entry_id` is `None` if caching it failed
    Generated { entry_id: Option<EntryId> },
}

/// A response served through the cache
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub response: String,
    pub source: AnswerSource,
}

/// Builder wiring a cache configuration to its collaborators
#[derive(Debug)]
pub struct SemanticCacheBuilder {
    config: CacheConfiguration,
    store: Option<Arc<dyn EntryStore>>,
    index: Option<Arc<dyn SimilarityIndex>>,
    embedder: Option<Arc<dyn Embedder>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SemanticCacheBuilder {
    /// Use a specific entry store (defaults to in-memory)
    pub fn with_store(mut self, store: Arc<dyn EntryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a specific similarity index (defaults to a flat scan)
    pub fn with_index(mut self, index: Arc<dyn SimilarityIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Embedder used by the text-only `check` and `store`
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration against the store and build the index.
    ///
    /// A non-empty store written under a different dimension or metric is
    /// rejected rather than silently mixed with new vectors.
    pub async fn build(self) -> Result<SemanticCacheService, CacheError> {
        let config = self.config;
        config.validate()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryEntryStore::new()));
        let index = self
            .index
            .unwrap_or_else(|| Arc::new(FlatIndex::new(config.dimension(), config.metric())));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        if let Some(layout) = store.load_layout().await? {
            if layout != config.layout() && store.len().await? > 0 {
                return Err(CacheError::configuration(format!(
                    "store holds entries for dimension {} / {} metric; cannot reopen with dimension {} / {} metric",
                    layout.dimension,
                    layout.metric,
                    config.dimension(),
                    config.metric()
                )));
            }
        }

        store.save_layout(config.layout()).await?;

        let eviction = Arc::new(EvictionManager::new(
            Arc::clone(&store),
            Arc::clone(&index),
            Arc::clone(&clock),
            config.capacity(),
        ));

        let service = SemanticCacheService {
            config,
            store,
            index,
            embedder: self.embedder,
            clock,
            eviction,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
            repairs: AtomicU64::new(0),
        };

        let indexed = service.rebuild_index().await?;
        service.eviction.enforce_capacity().await?;

        info!(
            "Semantic cache ready: dimension={}, threshold={}, metric={}, entries={}",
            service.config.dimension(),
            service.config.distance_threshold(),
            service.config.metric(),
            indexed
        );

        Ok(service)
    }
}

/// Semantic cache controller
#[derive(Debug)]
pub struct SemanticCacheService {
    config: CacheConfiguration,
    store: Arc<dyn EntryStore>,
    index: Arc<dyn SimilarityIndex>,
    embedder: Option<Arc<dyn Embedder>>,
    clock: Arc<dyn Clock>,
    eviction: Arc<EvictionManager>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    repairs: AtomicU64,
}

impl SemanticCacheService {
    /// Start building a cache for the given configuration
    pub fn builder(config: CacheConfiguration) -> SemanticCacheBuilder {
        SemanticCacheBuilder {
            config,
            store: None,
            index: None,
            embedder: None,
            clock: None,
        }
    }

    /// Configure an in-memory cache
    pub async fn configure(
        dimension: usize,
        distance_threshold: f32,
        capacity: Option<usize>,
        ttl: Option<Duration>,
        metric: Option<DistanceMetric>,
    ) -> Result<Self, CacheError> {
        let mut config = CacheConfiguration::new(dimension, distance_threshold)
            .with_metric(metric.unwrap_or_default());

        if let Some(capacity) = capacity {
            config = config.with_capacity(capacity);
        }

        if let Some(ttl) = ttl {
            config = config.with_ttl(ttl);
        }

        Self::builder(config).build().await
    }

    /// Get the configuration
    pub fn config(&self) -> &CacheConfiguration {
        &self.config
    }

    /// Get the eviction manager
    pub fn eviction(&self) -> &Arc<EvictionManager> {
        &self.eviction
    }

    /// Start a periodic TTL sweep
    pub fn spawn_sweeper(&self, every: Duration) -> SweeperHandle {
        self.eviction.spawn_sweeper(every)
    }

    fn embedder(&self) -> Result<&Arc<dyn Embedder>, CacheError> {
        self.embedder
            .as_ref()
            .ok_or_else(|| CacheError::configuration("no embedder configured for text queries"))
    }

    fn miss(&self) -> CacheLookup {
        self.misses.fetch_add(1, Ordering::Relaxed);
        record_check(false, None);
        CacheLookup::Miss
    }

    /// Look up a semantically similar cached response, embedding the query
    pub async fn check(&self, query_text: &str) -> Result<CacheLookup, CacheError> {
        let vector = self.embedder()?.embed(query_text).await?;
        self.check_vector(query_text, &vector).await
    }

    /// Look up a cached response for a precomputed query vector
    pub async fn check_vector(
        &self,
        query_text: &str,
        query_vector: &[f32],
    ) -> Result<CacheLookup, CacheError> {
        self.config.check_dimension(query_vector)?;

        let neighbors = match self.index.search(query_vector, 1).await {
            Ok(neighbors) => neighbors,
            Err(CacheError::DegenerateVector { message }) => {
                debug!("Degenerate query vector treated as miss: {}", message);
                return Ok(self.miss());
            }
            Err(e) => return Err(e),
        };

        let Some(candidate) = neighbors.first().copied() else {
            return Ok(self.miss());
        };

        if candidate.distance > self.config.distance_threshold() {
            debug!(
                "Semantic cache miss: nearest {} at distance {:.4} exceeds threshold {}",
                candidate.id,
                candidate.distance,
                self.config.distance_threshold()
            );
            return Ok(self.miss());
        }

        let Some(entry) = self.store.get(candidate.id).await? else {
            warn!(
                "Index references {} with no stored entry; removing it from the index",
                candidate.id
            );
            self.repairs.fetch_add(1, Ordering::Relaxed);
            record_repair();

            if let Err(e) = self.index.remove(candidate.id).await {
                warn!("Failed to remove dangling index entry {}: {}", candidate.id, e);
            }

            return Ok(self.miss());
        };

        if self.eviction.expire_if_needed(&entry).await? {
            return Ok(self.miss());
        }

        debug!(
            "Semantic cache hit with distance {:.4} for entry {} (query: {}...)",
            candidate.distance,
            entry.id(),
            query_text.chars().take(50).collect::<String>()
        );

        self.hits.fetch_add(1, Ordering::Relaxed);
        record_check(true, Some(candidate.distance));

        Ok(CacheLookup::Hit(CacheHit {
            entry_id: entry.id(),
            prompt: entry.prompt().to_string(),
            response: entry.response().to_string(),
            distance: candidate.distance,
            metadata: entry.metadata().cloned(),
        }))
    }

    /// Cache a response, embedding the query text
    pub async fn store(&self, query_text: &str, response: &str) -> Result<EntryId, CacheError> {
        self.store_request(StoreRequest::new(query_text, response))
            .await
    }

    /// Cache a response under a precomputed query vector
    pub async fn store_vector(
        &self,
        query_text: &str,
        query_vector: Vec<f32>,
        response: &str,
    ) -> Result<EntryId, CacheError> {
        self.store_request(StoreRequest::new(query_text, response).with_vector(query_vector))
            .await
    }

    /// Cache a response described by a full request
    pub async fn store_request(&self, request: StoreRequest) -> Result<EntryId, CacheError> {
        let vector = match request.vector {
            Some(vector) => vector,
            None => self.embedder()?.embed(&request.prompt).await?,
        };

        self.config.check_dimension(&vector)?;
        self.config.metric().validate(&vector)?;

        if let Some(ttl) = request.ttl {
            check_ttl(ttl)?;
        }

        let entry = self
            .store
            .insert(NewEntry {
                fingerprint: Fingerprint::new(vector, request.prompt),
                response: request.response,
                metadata: request.metadata,
                created_at: self.clock.now(),
                ttl: request.ttl.or(self.config.ttl()),
            })
            .await?;

        if let Err(e) = self
            .index
            .insert(entry.id(), entry.fingerprint().vector())
            .await
        {
            // Undo the store write so no entry is left undiscoverable
            if let Err(rollback) = self.store.delete(entry.id()).await {
                error!(
                    "Failed to roll back entry {} after index insert failed: {}",
                    entry.id(),
                    rollback
                );
                self.eviction.enqueue_repair(entry.id());
            }
            return Err(e);
        }

        self.stores.fetch_add(1, Ordering::Relaxed);
        record_store();
        debug!("Cached response as entry {}", entry.id());

        // The new entry is already durable and discoverable; eviction failures
        // stay on the repair queue instead of failing the store
        if let Err(e) = self.eviction.enforce_capacity().await {
            warn!("Capacity eviction after storing {} failed: {}", entry.id(), e);
        }

        Ok(entry.id())
    }

    /// Serve a query from the cache, generating and caching on a miss
    pub async fn answer(
        &self,
        query_text: &str,
        generator: &dyn ResponseGenerator,
    ) -> Result<Answer, CacheError> {
        let vector = self.embedder()?.embed(query_text).await?;

        if let CacheLookup::Hit(hit) = self.check_vector(query_text, &vector).await? {
            return Ok(Answer {
                response: hit.response,
                source: AnswerSource::Cache {
                    entry_id: hit.entry_id,
                    distance: hit.distance,
                },
            });
        }

        let response = generator.generate(query_text).await?;

        let entry_id = match self
            .store_request(StoreRequest::new(query_text, response.clone()).with_vector(vector))
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Generated response could not be cached: {}", e);
                None
            }
        };

        Ok(Answer {
            response,
            source: AnswerSource::Generated { entry_id },
        })
    }

    /// Delete one entry from both the index and the store
    pub async fn delete(&self, id: EntryId) -> Result<bool, CacheError> {
        self.eviction
            .remove_entry(id, EvictionReason::Explicit)
            .await
    }

    /// Remove every entry.
    ///
    /// The store is cleared first. If clearing the index then fails, the ids
    /// left behind are healed by later checks.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.store.clear().await?;
        self.index.clear().await?;
        info!("Semantic cache cleared");
        Ok(())
    }

    /// Rebuild the index from the store contents, dropping expired entries.
    ///
    /// Returns the number of entries indexed.
    pub async fn rebuild_index(&self) -> Result<usize, CacheError> {
        self.index.clear().await?;

        let now = self.clock.now();
        let mut stream = self.store.iterate();
        let mut indexed = 0;

        while let Some(entry) = stream.try_next().await? {
            if entry.is_expired(now) {
                self.eviction
                    .remove_entry(entry.id(), EvictionReason::Ttl)
                    .await?;
                continue;
            }

            let vector = entry.fingerprint().vector();
            if vector.len() != self.config.dimension() {
                return Err(CacheError::configuration(format!(
                    "stored entry {} has dimension {}, cache is configured for {}",
                    entry.id(),
                    vector.len(),
                    self.config.dimension()
                )));
            }

            self.index.insert(entry.id(), vector).await?;
            indexed += 1;
        }

        Ok(indexed)
    }

    /// Get cache statistics
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(CacheStats {
            entry_count: self.store.len().await?,
            index_size: self.index.size().await?,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            evictions: self.eviction.evictions(),
            expirations: self.eviction.expirations(),
            repairs: self.repairs.load(Ordering::Relaxed),
            pending_repairs: self.eviction.pending_repairs(),
        })
    }
}
