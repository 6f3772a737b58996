//! Embedding infrastructure - adapters around embedding capabilities

mod offloaded;

pub use offloaded::OffloadedEmbedder;
