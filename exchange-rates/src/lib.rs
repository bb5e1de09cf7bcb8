//! # Exchange Rates
//!
//! Upstream rate source adapters implementing the `RateProvider` port, the
//! fee provider adapters, and the factory that picks one of each from
//! configuration.
//!
//! ## Providers
//!
//! - [`LatestRatesProvider`] - `GET {base}/latest?base=FROM`, optional access key
//! - [`ConversionRatesProvider`] - `GET {base}/{key}/latest/FROM`, key required
//! - [`PtaxProvider`] - Central Bank of Brazil PTAX sell quotes, pivoted through BRL
//!
//! All three cache the raw upstream body under `rates:<provider>:<BASE>` for
//! [`RAW_RATES_TTL`], return identity conversions untouched, and abort with
//! `ConvertError::Cancelled` as soon as the caller's token fires.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use exchange_rates::{build_provider, ProviderSettings};
//!
//! let settings = ProviderSettings { provider: "bcb".into(), ..Default::default() };
//! let provider = build_provider(&settings, reqwest::Client::new(), Arc::new(cache));
//! let brl = provider.convert(&cancel, &usd, &brl, 10_000).await?;
//! ```

pub mod factory;
pub mod fee;
pub mod http;
pub mod keyed;
pub mod latest;
pub mod ptax;
mod rates;

pub use factory::{
    FeeSettings, ProviderKind, ProviderSettings, build_fee_provider, build_provider,
};
pub use fee::{FEE_TIMEOUT, RemoteFee, StaticFee};
pub use http::HttpSettings;
pub use keyed::{CONVERSION_RATES_NAME, ConversionRatesProvider, DEFAULT_CONVERSION_RATES_URL};
pub use latest::{DEFAULT_LATEST_RATES_URL, LATEST_RATES_NAME, LatestRatesProvider};
pub use ptax::{DEFAULT_PTAX_URL, PTAX_NAME, PtaxConfig, PtaxProvider, PtaxQuote};
pub use rates::{RAW_RATES_TTL, rates_cache_key};
