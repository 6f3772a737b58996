use thiserror::Error;

/// Errors raised by the semantic cache engine
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Degenerate vector: {message}")]
    DegenerateVector { message: String },

    #[error("Backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("Embedding error: {message}")]
    Embedding { message: String },

    #[error("Generation error: {message}")]
    Generation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CacheError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn degenerate_vector(message: impl Into<String>) -> Self {
        Self::DegenerateVector {
            message: message.into(),
        }
    }

    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether a caller may retry the failed operation with backoff.
    ///
    /// Structural errors (configuration, dimension, degenerate input) are
    /// caller mistakes and never become valid by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable { .. } | Self::Embedding { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_error() {
        let error = CacheError::dimension_mismatch(768, 3);
        assert_eq!(error.to_string(), "Dimension mismatch: expected 768, got 3");
    }

    #[test]
    fn test_configuration_error() {
        let error = CacheError::configuration("dimension must be positive");
        assert_eq!(
            error.to_string(),
            "Configuration error: dimension must be positive"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(CacheError::backend_unavailable("redis down").is_retryable());
        assert!(CacheError::embedding("timeout").is_retryable());
        assert!(!CacheError::dimension_mismatch(3, 2).is_retryable());
        assert!(!CacheError::degenerate_vector("zero norm").is_retryable());
        assert!(!CacheError::configuration("bad").is_retryable());
    }
}
