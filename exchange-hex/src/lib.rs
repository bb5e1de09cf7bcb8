//! # Exchange Hex
//!
//! Application service layer and HTTP adapter for the conversion engine.
//!
//! ## Architecture
//!
//! - `service/` - Application service (result cache, provider, fee composition)
//! - `inbound/` - HTTP adapter (Axum server)
//! - `openapi/` - Generated OpenAPI document
//!
//! The service is generic over `C: Cache`, allowing different cache
//! backends to be injected; providers arrive as `Arc<dyn RateProvider>`.

pub mod inbound;
pub mod openapi;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use service::{ConversionService, DEFAULT_RESULT_TTL};
