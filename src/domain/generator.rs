//! The expensive computation whose results are cached

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::CacheError;

/// Produces a response for a prompt, e.g. by calling a language model.
///
/// Only the application-level answer flow invokes this; the cache engine
/// itself never does.
#[async_trait]
pub trait ResponseGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &str) -> Result<String, CacheError>;
}
