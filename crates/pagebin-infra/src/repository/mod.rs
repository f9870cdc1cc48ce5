//! Repository implementations.

mod memory;

pub use memory::{InMemorySiteRepository, InMemoryUserRepository};
