//! Replay command - runs recorded queries through a cache
//!
//! Each record carries its own query vector, so no embedding model is needed.
//! Misses are stored, which makes later paraphrases in the same file hit.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::infrastructure::services::{CacheLookup, CacheStats, SemanticCacheService};

/// Arguments for the replay command
#[derive(Args, Clone)]
pub struct ReplayArgs {
    /// JSON file holding an array of `{query, vector, response}` records
    pub file: PathBuf,
}

/// One recorded interaction
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRecord {
    pub query: String,
    pub vector: Vec<f32>,
    pub response: String,
}

/// Outcome of a replay
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaySummary {
    pub records: usize,
    pub hits: usize,
    pub misses: usize,
    pub stats: CacheStats,
}

/// Run the replay command
pub async fn run(config_path: Option<PathBuf>, args: ReplayArgs) -> anyhow::Result<()> {
    let config = super::bootstrap(config_path.as_ref())?;

    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let records: Vec<ReplayRecord> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", args.file.display()))?;

    let cache = SemanticCacheService::builder(config.cache.to_configuration()?)
        .build()
        .await?;

    let sweeper = config
        .cache
        .sweep_interval()
        .map(|every| cache.spawn_sweeper(every));

    let summary = replay(&cache, &records).await?;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
    }

    info!(
        "Replayed {} records: {} hits, {} misses (hit rate {:.1}%)",
        summary.records,
        summary.hits,
        summary.misses,
        summary.stats.hit_rate() * 100.0
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Check each record and store it on a miss
pub async fn replay(
    cache: &SemanticCacheService,
    records: &[ReplayRecord],
) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary {
        records: records.len(),
        ..Default::default()
    };

    for (position, record) in records.iter().enumerate() {
        match cache.check_vector(&record.query, &record.vector).await? {
            CacheLookup::Hit(hit) => {
                debug!(
                    "#{} hit entry {} at distance {:.4}",
                    position, hit.entry_id, hit.distance
                );
                summary.hits += 1;
            }
            CacheLookup::Miss => {
                let id = cache
                    .store_vector(&record.query, record.vector.clone(), &record.response)
                    .await
                    .with_context(|| format!("storing record #{}", position))?;
                debug!("#{} miss, stored as {}", position, id);
                summary.misses += 1;
            }
        }
    }

    summary.stats = cache.stats().await?;

    Ok(summary)
}
