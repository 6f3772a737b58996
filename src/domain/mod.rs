//! Domain layer - Core cache entities, traits and errors

pub mod clock;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod semantic_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use distance::DistanceMetric;
pub use embedding::{BlockingEmbedder, Embedder};
pub use error::CacheError;
pub use generator::ResponseGenerator;
pub use semantic_cache::{
    CacheConfiguration, CacheLayout, Entry, EntryId, EntryStore, EntryStream, Fingerprint,
    Neighbor, NewEntry, SimilarityIndex,
};
