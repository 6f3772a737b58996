//! Query fingerprints

use serde::{Deserialize, Serialize};

/// A comparable representation of a query: its embedding vector plus the
/// original text it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    vector: Vec<f32>,
    source_text: String,
}

impl Fingerprint {
    /// Create a new fingerprint
    pub fn new(vector: Vec<f32>, source_text: impl Into<String>) -> Self {
        Self {
            vector,
            source_text: source_text.into(),
        }
    }

    /// Get the vector
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Get the text the vector was computed from
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Number of components in the vector
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}
