use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::semantic_cache::CacheConfiguration;
use crate::domain::{CacheError, DistanceMetric};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Raw cache settings as read from files and the environment.
///
/// `dimension` and `distance_threshold` depend on the embedding model and
/// have no defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub dimension: Option<usize>,
    pub distance_threshold: Option<f32>,
    pub capacity: Option<usize>,
    pub ttl_secs: Option<u64>,
    #[serde(default)]
    pub metric: DistanceMetric,
    pub sweep_interval_secs: Option<u64>,
}

impl CacheSettings {
    /// Build and validate the cache configuration
    pub fn to_configuration(&self) -> Result<CacheConfiguration, CacheError> {
        let dimension = self
            .dimension
            .ok_or_else(|| CacheError::configuration("cache.dimension is required"))?;
        let threshold = self
            .distance_threshold
            .ok_or_else(|| CacheError::configuration("cache.distance_threshold is required"))?;

        let mut config = CacheConfiguration::new(dimension, threshold).with_metric(self.metric);

        if let Some(capacity) = self.capacity {
            config = config.with_capacity(capacity);
        }

        if let Some(secs) = self.ttl_secs {
            config = config.with_ttl(Duration::from_secs(secs));
        }

        config.validate()?;

        Ok(config)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        config.try_deserialize()
    }

    /// Load from an explicit file, still honouring environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        config.try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("SEMCACHE")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_full_settings() {
        let config = from_toml(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [cache]
            dimension = 768
            distance_threshold = 0.08
            capacity = 500
            ttl_secs = 120
            metric = "euclidean"
            "#,
        );

        assert_eq!(config.logging.level, "debug");
        assert!(matches!(config.logging.format, LogFormat::Json));

        let cache = config.cache.to_configuration().unwrap();
        assert_eq!(cache.dimension(), 768);
        assert!((cache.distance_threshold() - 0.08).abs() < f32::EPSILON);
        assert_eq!(cache.capacity(), Some(500));
        assert_eq!(cache.ttl(), Some(Duration::from_secs(120)));
        assert_eq!(cache.metric(), DistanceMetric::Euclidean);
    }

    #[test]
    fn test_dimension_and_threshold_required() {
        let missing_dimension = from_toml("[cache]\ndistance_threshold = 0.1\n");
        assert!(matches!(
            missing_dimension.cache.to_configuration(),
            Err(CacheError::Configuration { .. })
        ));

        let missing_threshold = from_toml("[cache]\ndimension = 3\n");
        assert!(matches!(
            missing_threshold.cache.to_configuration(),
            Err(CacheError::Configuration { .. })
        ));
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("[cache]\ndimension = 3\ndistance_threshold = 0.1\n");

        assert_eq!(config.logging.level, "info");
        assert!(matches!(config.logging.format, LogFormat::Pretty));
        assert_eq!(config.cache.metric, DistanceMetric::Cosine);
        assert_eq!(config.cache.sweep_interval(), None);

        let cache = config.cache.to_configuration().unwrap();
        assert_eq!(cache.capacity(), None);
        assert_eq!(cache.ttl(), None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_ttl = from_toml("[cache]\ndimension = 3\ndistance_threshold = 0.1\nttl_secs = 0\n");
        assert!(zero_ttl.cache.to_configuration().is_err());

        let zero_capacity =
            from_toml("[cache]\ndimension = 3\ndistance_threshold = 0.1\ncapacity = 0\n");
        assert!(zero_capacity.cache.to_configuration().is_err());
    }
}
