//! Eviction manager - TTL expiry and capacity bounds
//!
//! Removes entries from the similarity index first and the entry store second,
//! so readers can never discover an id whose entry is already gone. A store
//! delete that fails after the index removal leaves an orphaned entry; its id
//! goes on a repair queue that every later pass retries before doing new work.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::TryStreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::semantic_cache::{Entry, EntryId, EntryStore, SimilarityIndex};
use crate::domain::{CacheError, Clock};
use crate::infrastructure::observability::{record_eviction, EvictionReason};

/// Removes entries from both structures under TTL and capacity policies
#[derive(Debug)]
pub struct EvictionManager {
    store: Arc<dyn EntryStore>,
    index: Arc<dyn SimilarityIndex>,
    clock: Arc<dyn Clock>,
    capacity: Option<usize>,
    capacity_pass: AtomicBool,
    repairs: Mutex<Vec<EntryId>>,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl EvictionManager {
    pub fn new(
        store: Arc<dyn EntryStore>,
        index: Arc<dyn SimilarityIndex>,
        clock: Arc<dyn Clock>,
        capacity: Option<usize>,
    ) -> Self {
        Self {
            store,
            index,
            clock,
            capacity,
            capacity_pass: AtomicBool::new(false),
            repairs: Mutex::new(Vec::new()),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Entries removed to honour the capacity bound
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Entries removed because their TTL elapsed
    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    /// Ids whose store delete failed and is awaiting retry
    pub fn pending_repairs(&self) -> usize {
        self.repairs.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    /// Remove one entry from the index and then the store.
    ///
    /// Returns whether the store held the entry.
    pub async fn remove_entry(
        &self,
        id: EntryId,
        reason: EvictionReason,
    ) -> Result<bool, CacheError> {
        self.index.remove(id).await?;

        match self.store.delete(id).await {
            Ok(existed) => {
                if existed {
                    self.count(reason);
                }
                Ok(existed)
            }
            Err(e) => {
                error!(
                    "Entry {} removed from index but store delete failed, queued for repair: {}",
                    id, e
                );
                self.enqueue_repair(id);
                Err(e)
            }
        }
    }

    /// Evict the entry if it has outlived its TTL. Returns whether it did.
    pub async fn expire_if_needed(&self, entry: &Entry) -> Result<bool, CacheError> {
        if !entry.is_expired(self.clock.now()) {
            return Ok(false);
        }

        debug!("Entry {} expired at {:?}", entry.id(), entry.expires_at());
        self.remove_entry(entry.id(), EvictionReason::Ttl).await?;
        Ok(true)
    }

    /// Scan every entry and remove the expired ones
    pub async fn sweep_expired(&self) -> Result<usize, CacheError> {
        self.retry_repairs().await;

        let now = self.clock.now();
        let expired: Vec<EntryId> = self
            .store
            .iterate()
            .try_filter(|entry| futures::future::ready(entry.is_expired(now)))
            .map_ok(|entry| entry.id())
            .try_collect()
            .await?;

        let mut removed = 0;
        for id in expired {
            if self.remove_entry(id, EvictionReason::Ttl).await? {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Expired {} semantic cache entries", removed);
        }

        Ok(removed)
    }

    /// Evict the oldest entries until the store is within capacity.
    ///
    /// Only one pass runs at a time. A caller finding a pass in progress
    /// returns immediately; the running pass re-reads the size after
    /// releasing the flag and goes again while the store is still over
    /// capacity, so entries inserted meanwhile are still accounted for.
    pub async fn enforce_capacity(&self) -> Result<usize, CacheError> {
        let Some(capacity) = self.capacity else {
            return Ok(0);
        };

        let mut evicted = 0;

        loop {
            if self
                .capacity_pass
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return Ok(evicted);
            }

            let result = self.evict_over_capacity(capacity).await;
            self.capacity_pass.store(false, Ordering::SeqCst);

            let removed = result?;
            evicted += removed.unwrap_or(0);

            if self.store.len().await? <= capacity {
                return Ok(evicted);
            }

            if removed == Some(0) {
                warn!(
                    "Store is over capacity {} but no entry could be evicted",
                    capacity
                );
                return Ok(evicted);
            }
        }
    }

    /// One eviction round. `None` when the store was already within capacity.
    async fn evict_over_capacity(&self, capacity: usize) -> Result<Option<usize>, CacheError> {
        self.retry_repairs().await;

        let len = self.store.len().await?;
        if len <= capacity {
            return Ok(None);
        }

        let victims = self.oldest(len - capacity).await?;
        let mut removed = 0;

        for id in victims {
            if self.remove_entry(id, EvictionReason::Capacity).await? {
                removed += 1;
            }
        }

        debug!("Evicted {} entries over capacity {}", removed, capacity);

        Ok(Some(removed))
    }

    /// The `n` least recently inserted entries, by creation time then id
    async fn oldest(&self, n: usize) -> Result<Vec<EntryId>, CacheError> {
        let mut candidates: Vec<_> = self
            .store
            .iterate()
            .map_ok(|entry| (entry.created_at(), entry.id()))
            .try_collect()
            .await?;

        candidates.sort_unstable();
        candidates.truncate(n);

        Ok(candidates.into_iter().map(|(_, id)| id).collect())
    }

    fn count(&self, reason: EvictionReason) {
        match reason {
            EvictionReason::Capacity => {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
            EvictionReason::Ttl => {
                self.expirations.fetch_add(1, Ordering::Relaxed);
            }
            EvictionReason::Explicit => {}
        }

        record_eviction(reason);
    }

    pub(crate) fn enqueue_repair(&self, id: EntryId) {
        match self.repairs.lock() {
            Ok(mut queue) => {
                if !queue.contains(&id) {
                    queue.push(id);
                }
            }
            Err(e) => error!("Repair queue unavailable, entry {} left orphaned: {}", id, e),
        }
    }

    /// Retry store deletes that failed in earlier passes
    pub async fn retry_repairs(&self) {
        let pending: Vec<EntryId> = match self.repairs.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => return,
        };

        for id in pending {
            match self.store.delete(id).await {
                Ok(_) => debug!("Repaired orphaned entry {}", id),
                Err(e) => {
                    warn!("Repair of entry {} failed again: {}", id, e);
                    self.enqueue_repair(id);
                }
            }
        }
    }

    /// Run [`sweep_expired`](Self::sweep_expired) on a fixed interval
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let manager = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = manager.sweep_expired().await {
                            warn!("TTL sweep failed: {}", e);
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            running_clone.store(false, Ordering::Relaxed);
            info!("TTL sweeper stopped");
        });

        SweeperHandle {
            shutdown_tx,
            running,
            task,
        }
    }
}

/// Handle for controlling the background TTL sweeper
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    running: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for it to finish
    pub async fn shutdown(self) {
        // Receiver is gone if the task already exited
        self.shutdown_tx.send(()).await.ok();
        self.task.await.ok();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
