//! Embedding capability consumed by the cache

mod provider;

pub use provider::{ensure_batch_len, BlockingEmbedder, Embedder};

#[cfg(test)]
pub use provider::mock::MockEmbedder;
