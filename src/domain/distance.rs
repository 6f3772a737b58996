//! Distance metrics between fingerprint vectors

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::CacheError;

/// Dissimilarity measure used by the similarity index.
///
/// Every metric is commutative and non-negative, and returns zero for
/// identical vectors (cosine also for proportional ones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine distance: `1 - (a·b)/(|a||b|)`
    #[default]
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
}

impl DistanceMetric {
    /// Compute the distance between two vectors
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32, CacheError> {
        if a.len() != b.len() {
            return Err(CacheError::dimension_mismatch(a.len(), b.len()));
        }

        match self {
            Self::Cosine => cosine_distance(a, b),
            Self::Euclidean => Ok(euclidean_distance(a, b)),
        }
    }

    /// Reject vectors this metric cannot compare
    pub fn validate(&self, vector: &[f32]) -> Result<(), CacheError> {
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(CacheError::degenerate_vector(
                "vector contains non-finite components",
            ));
        }

        if *self == Self::Cosine {
            checked_norm(vector)?;
        }

        Ok(())
    }

    /// Convert a cosine similarity score into the equivalent distance
    pub fn similarity_to_distance(similarity: f32) -> f32 {
        1.0 - similarity
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            _ => Err(CacheError::configuration(format!(
                "Unknown distance metric: {}. Valid metrics: cosine, euclidean",
                s
            ))),
        }
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Norm usable as a cosine divisor: finite and non-zero.
///
/// Components too large overflow to infinity and components too small
/// underflow to zero; both make the angle unmeasurable in `f32`.
fn checked_norm(v: &[f32]) -> Result<f32, CacheError> {
    let n = norm(v);

    if n == 0.0 {
        return Err(CacheError::degenerate_vector(
            "zero-magnitude vector under cosine distance",
        ));
    }

    if !n.is_finite() {
        return Err(CacheError::degenerate_vector(
            "vector magnitude overflows under cosine distance",
        ));
    }

    Ok(n)
}

fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32, CacheError> {
    let norm_a = checked_norm(a)?;
    let norm_b = checked_norm(b)?;

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let similarity = dot_product / (norm_a * norm_b);

    if !dot_product.is_finite() || !(norm_a * norm_b).is_finite() || !similarity.is_finite() {
        return Err(CacheError::degenerate_vector(format!(
            "cosine similarity is not finite (dot product {}, norms {} and {})",
            dot_product, norm_a, norm_b
        )));
    }

    // Rounding can push identical vectors slightly below zero
    Ok((1.0 - similarity.clamp(-1.0, 1.0)).max(0.0))
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
