//! Semantic cache infrastructure - store and index implementations

mod flat_index;
mod in_memory;

pub use flat_index::FlatIndex;
pub use in_memory::InMemoryEntryStore;
