//! Observability infrastructure - Metrics

mod recorder;

pub use recorder::{record_check, record_eviction, record_repair, record_store, EvictionReason};
