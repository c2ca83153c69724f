//! # Binx Adapter
//!
//! Moves records from one collection definition to another. An `Adapter` turns
//! one collection into another and may pass context values along. The
//! `Registry` knows which collections exist and which adapters connect them,
//! and can run the shortest adapter chain between any two of them.

pub mod adapter;
pub mod error;
pub mod path;
pub mod registry;

pub use adapter::{Adapter, AdapterOutput, call_adapter};
pub use error::{AdapterError, RegistryError};
pub use path::bfs_shortest_path;
pub use registry::{Registry, RegistryEntry};
