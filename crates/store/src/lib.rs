//! Storage adapters for the pizzalend core.
//!
//! - [`MemoryStore`]: thread-safe in-memory implementation of the reserve,
//!   position and supply interfaces, enforcing anchor uniqueness on write
//! - [`Snapshot`]: TOML/JSON seed files for a store

mod memory;
mod snapshot;

pub use memory::{MemoryStore, StoreError};
pub use snapshot::Snapshot;
