//! # Exchange Cache
//!
//! Concrete cache implementations (adapters) for the conversion engine.
//! Every adapter implements the `Cache` port from `exchange-types`; a
//! networked store can be swapped in by implementing the same trait.

pub mod memory;

pub use memory::{MemoryCache, MemoryCacheConfig};
