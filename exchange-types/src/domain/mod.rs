//! Domain models for the conversion engine.

pub mod currency;
pub mod money;

pub use currency::CurrencyCode;
pub use money::FeeBreakdown;
