//! Adapter running a blocking embedder on tokio's blocking pool

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::embedding::{ensure_batch_len, BlockingEmbedder, Embedder};
use crate::domain::CacheError;

/// Exposes a [`BlockingEmbedder`] through the non-blocking [`Embedder`] trait.
///
/// Each call is moved onto tokio's blocking thread pool so async callers are
/// never stalled by the embedding computation.
#[derive(Debug)]
pub struct OffloadedEmbedder<E> {
    inner: Arc<E>,
}

impl<E> OffloadedEmbedder<E>
where
    E: BlockingEmbedder + 'static,
{
    pub fn new(inner: E) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn from_arc(inner: Arc<E>) -> Self {
        Self { inner }
    }

    /// Access the wrapped embedder for synchronous call sites
    pub fn blocking(&self) -> &E {
        &self.inner
    }
}

fn join_error(e: tokio::task::JoinError) -> CacheError {
    CacheError::internal(format!("Embedding task failed: {}", e))
}

#[async_trait]
impl<E> Embedder for OffloadedEmbedder<E>
where
    E: BlockingEmbedder + 'static,
{
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CacheError> {
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || inner.embed(&text))
            .await
            .map_err(join_error)?
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CacheError> {
        let inner = Arc::clone(&self.inner);
        let owned = texts.to_vec();

        let vectors = tokio::task::spawn_blocking(move || inner.embed_many(&owned))
            .await
            .map_err(join_error)??;

        ensure_batch_len(texts.len(), &vectors)?;

        Ok(vectors)
    }
}
