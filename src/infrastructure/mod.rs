//! Infrastructure layer - Storage, indexing and runtime services

pub mod embedding;
pub mod logging;
pub mod observability;
pub mod semantic_cache;
pub mod services;
