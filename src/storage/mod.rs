//! Storage implementations of the persistence ports

pub mod in_memory;

pub use in_memory::{InMemoryDataService, InMemoryMenuStore, InMemoryOrderStore};
