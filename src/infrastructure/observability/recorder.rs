//! Cache metrics recorded through the `metrics` facade
//!
//! Nothing is exported here; the embedding application installs whichever
//! recorder it uses (Prometheus, statsd, ...).

use metrics::{counter, histogram};

/// Why an entry left the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    Capacity,
    Ttl,
    Explicit,
}

impl EvictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
            Self::Ttl => "ttl",
            Self::Explicit => "explicit",
        }
    }
}

/// Record a check outcome, with the match distance for hits
pub fn record_check(hit: bool, distance: Option<f32>) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("semcache_checks_total", "outcome" => outcome).increment(1);

    if let Some(distance) = distance {
        histogram!("semcache_hit_distance").record(distance as f64);
    }
}

/// Record a successful store
pub fn record_store() {
    counter!("semcache_stores_total").increment(1);
}

/// Record one evicted entry
pub fn record_eviction(reason: EvictionReason) {
    counter!("semcache_evictions_total", "reason" => reason.as_str()).increment(1);
}

/// Record an index entry healed because its store entry was missing
pub fn record_repair() {
    counter!("semcache_repairs_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_reason_labels() {
        assert_eq!(EvictionReason::Capacity.as_str(), "capacity");
        assert_eq!(EvictionReason::Ttl.as_str(), "ttl");
        assert_eq!(EvictionReason::Explicit.as_str(), "explicit");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_check(true, Some(0.01));
        record_check(false, None);
        record_store();
        record_eviction(EvictionReason::Ttl);
        record_repair();
    }
}
