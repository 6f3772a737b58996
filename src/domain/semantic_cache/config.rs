//! Semantic cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{CacheError, DistanceMetric};

/// Configuration for a semantic cache instance.
///
/// `dimension` and `distance_threshold` are tied to the embedding model in
/// use, so neither has a default. The configuration is fixed for the lifetime
/// of the cache it builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfiguration {
    /// Length of every stored and query vector
    dimension: usize,

    /// Maximum distance accepted as a hit (smaller is stricter)
    distance_threshold: f32,

    /// Maximum number of entries kept before FIFO eviction
    #[serde(default)]
    capacity: Option<usize>,

    /// Default time-to-live for new entries
    #[serde(default)]
    ttl: Option<Duration>,

    /// Distance metric used for comparisons
    #[serde(default)]
    metric: DistanceMetric,
}

impl CacheConfiguration {
    /// Create a configuration with the required parameters
    pub fn new(dimension: usize, distance_threshold: f32) -> Self {
        Self {
            dimension,
            distance_threshold,
            capacity: None,
            ttl: None,
            metric: DistanceMetric::default(),
        }
    }

    /// Set the capacity bound
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the default TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the distance metric
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the threshold from a cosine similarity score.
    ///
    /// A similarity of 0.9 becomes a distance threshold of 0.1.
    pub fn with_similarity_threshold(mut self, similarity: f32) -> Self {
        self.distance_threshold = DistanceMetric::similarity_to_distance(similarity);
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn distance_threshold(&self) -> f32 {
        self.distance_threshold
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Layout that stored entries depend on
    pub fn layout(&self) -> CacheLayout {
        CacheLayout {
            dimension: self.dimension,
            metric: self.metric,
        }
    }

    /// Check every parameter is within its allowed range
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.dimension == 0 {
            return Err(CacheError::configuration("dimension must be positive"));
        }

        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            return Err(CacheError::configuration(format!(
                "distance threshold must be a finite value >= 0, got {}",
                self.distance_threshold
            )));
        }

        if self.capacity == Some(0) {
            return Err(CacheError::configuration("capacity must be positive"));
        }

        if let Some(ttl) = self.ttl {
            check_ttl(ttl)?;
        }

        Ok(())
    }

    /// Check a vector has the configured length
    pub fn check_dimension(&self, vector: &[f32]) -> Result<(), CacheError> {
        if vector.len() != self.dimension {
            return Err(CacheError::dimension_mismatch(self.dimension, vector.len()));
        }

        Ok(())
    }
}

/// Reject a TTL that is zero or too long to add to a timestamp
pub fn check_ttl(ttl: Duration) -> Result<(), CacheError> {
    if ttl == Duration::ZERO {
        return Err(CacheError::configuration("ttl must be positive"));
    }

    if chrono::Duration::from_std(ttl).is_err() {
        return Err(CacheError::configuration(format!(
            "ttl of {}s is too long to track",
            ttl.as_secs()
        )));
    }

    Ok(())
}

/// The parameters that stored vectors are only meaningful under.
///
/// Persisted alongside entries so a store reopened with a different
/// dimension or metric is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheLayout {
    pub dimension: usize,
    pub metric: DistanceMetric,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CacheConfiguration::new(768, 0.1)
            .with_capacity(500)
            .with_ttl(Duration::from_secs(1800))
            .with_metric(DistanceMetric::Euclidean);

        assert_eq!(config.dimension(), 768);
        assert!((config.distance_threshold() - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.capacity(), Some(500));
        assert_eq!(config.ttl(), Some(Duration::from_secs(1800)));
        assert_eq!(config.metric(), DistanceMetric::Euclidean);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_to_cosine_unbounded() {
        let config = CacheConfiguration::new(3, 0.0);

        assert_eq!(config.metric(), DistanceMetric::Cosine);
        assert!(config.capacity().is_none());
        assert!(config.ttl().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unrepresentable_ttl_rejected() {
        let config = CacheConfiguration::new(3, 0.1).with_ttl(Duration::MAX);
        assert!(matches!(
            config.validate(),
            Err(CacheError::Configuration { .. })
        ));

        assert!(check_ttl(Duration::ZERO).is_err());
        assert!(check_ttl(Duration::from_secs(365 * 24 * 3600)).is_ok());
    }

    #[test]
    fn test_similarity_threshold_inverted() {
        let config = CacheConfiguration::new(3, 0.5).with_similarity_threshold(0.9);
        assert!((config.distance_threshold() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(CacheConfiguration::new(0, 0.1).validate().is_err());
        assert!(CacheConfiguration::new(3, -0.1).validate().is_err());
        assert!(CacheConfiguration::new(3, f32::NAN).validate().is_err());
        assert!(CacheConfiguration::new(3, f32::INFINITY).validate().is_err());
        assert!(CacheConfiguration::new(3, 0.1).with_capacity(0).validate().is_err());
        assert!(
            CacheConfiguration::new(3, 0.1)
                .with_ttl(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_check_dimension() {
        let config = CacheConfiguration::new(3, 0.1);

        assert!(config.check_dimension(&[1.0, 2.0, 3.0]).is_ok());
        assert!(matches!(
            config.check_dimension(&[1.0]),
            Err(CacheError::DimensionMismatch {
                expected: 3,
                actual: 1
            })
        ));
    }
}
