//! Embedding capability traits

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::CacheError;

/// Turns text into fixed-length vectors without blocking the caller
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CacheError>;

    /// Embed a batch. Output order matches input order.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CacheError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for text in texts {
            vectors.push(self.embed(text).await?);
        }

        Ok(vectors)
    }
}

/// Synchronous embedding, for call sites that may block
pub trait BlockingEmbedder: Send + Sync + Debug {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, CacheError>;

    /// Embed a batch. Output order matches input order.
    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CacheError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Check a batch result lines up with its inputs
pub fn ensure_batch_len(inputs: usize, vectors: &[Vec<f32>]) -> Result<(), CacheError> {
    if inputs != vectors.len() {
        return Err(CacheError::embedding(format!(
            "embedder returned {} vectors for {} inputs",
            vectors.len(),
            inputs
        )));
    }

    Ok(())
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Embedder returning fixed vectors for known texts
    #[derive(Debug, Default)]
    pub struct MockEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        error: Option<String>,
        calls: AtomicUsize,
    }

    impl MockEmbedder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.vectors.insert(text.into(), vector);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }

        fn lookup(&self, text: &str) -> Result<Vec<f32>, CacheError> {
            self.calls.fetch_add(1, Ordering::Relaxed);

            if let Some(ref error) = self.error {
                return Err(CacheError::embedding(error.clone()));
            }

            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| CacheError::embedding(format!("no vector for '{}'", text)))
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, CacheError> {
            self.lookup(text)
        }
    }

    impl BlockingEmbedder for MockEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, CacheError> {
            self.lookup(text)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_embedder_known_text() {
            let embedder = MockEmbedder::new().with_vector("hello", vec![1.0, 0.0]);

            let vector = Embedder::embed(&embedder, "hello").await.unwrap();

            assert_eq!(vector, vec![1.0, 0.0]);
            assert_eq!(embedder.calls(), 1);
        }

        #[tokio::test]
        async fn test_default_embed_many_preserves_order() {
            let embedder = MockEmbedder::new()
                .with_vector("a", vec![1.0])
                .with_vector("b", vec![2.0]);

            let vectors = Embedder::embed_many(&embedder, &["b".into(), "a".into()])
                .await
                .unwrap();

            assert_eq!(vectors, vec![vec![2.0], vec![1.0]]);
        }

        #[tokio::test]
        async fn test_mock_embedder_error() {
            let embedder = MockEmbedder::new().with_error("ollama unreachable");

            let result = Embedder::embed(&embedder, "hello").await;

            assert!(matches!(result, Err(CacheError::Embedding { .. })));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_batch_len() {
        assert!(ensure_batch_len(2, &[vec![1.0], vec![2.0]]).is_ok());
        assert!(ensure_batch_len(3, &[vec![1.0]]).is_err());
    }
}
