//! # Exchange Types
//!
//! Domain types and port traits for the currency conversion engine.
//! This crate performs no IO - only data structures, cents arithmetic,
//! and the trait definitions that adapters implement.
//!
//! ## Architecture
//!
//! This crate is the **innermost core** of the hexagonal architecture:
//! - `domain/` - Currency codes, cents arithmetic and fee composition
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for the HTTP boundary
//! - `error/` - Conversion, fee, cache and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{CurrencyCode, FeeBreakdown};
pub use dto::*;
pub use error::{AmountOverflow, AppError, CacheError, ConvertError, DomainError, FeeError};
pub use ports::{Cache, FeeProvider, RateProvider};
