//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod cache;
mod exchange;
mod fee;

pub use cache::Cache;
pub use exchange::RateProvider;
pub use fee::FeeProvider;
