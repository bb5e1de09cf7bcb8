//! Provider selection from configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use exchange_types::{Cache, FeeProvider, RateProvider};

use crate::fee::{RemoteFee, StaticFee};
use crate::http::HttpSettings;
use crate::keyed::{ConversionRatesProvider, DEFAULT_CONVERSION_RATES_URL};
use crate::latest::{DEFAULT_LATEST_RATES_URL, LatestRatesProvider};
use crate::ptax::{PtaxConfig, PtaxProvider};

/// The rate source implementations a provider name can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    LatestRates,
    ConversionRates,
    Ptax,
}

impl ProviderKind {
    /// Resolves a configured name; unknown names return `None`.
    ///
    /// Matching ignores case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "exchangerate.host" => Some(Self::LatestRates),
            "exchangerate-api" | "exchangerate-api.com" | "exchange-rate-api" => {
                Some(Self::ConversionRates)
            }
            "bcb" | "ptax" | "bcb-ptax" => Some(Self::Ptax),
            _ => None,
        }
    }
}

/// Everything the factory needs to build any of the providers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub provider: String,
    pub api_key: Option<String>,
    pub latest_rates: HttpSettings,
    pub conversion_rates: HttpSettings,
    pub ptax: PtaxConfig,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider: "exchangerate.host".to_string(),
            api_key: None,
            latest_rates: HttpSettings::new(DEFAULT_LATEST_RATES_URL, Duration::from_secs(10)),
            conversion_rates: HttpSettings::new(
                DEFAULT_CONVERSION_RATES_URL,
                Duration::from_secs(10),
            ),
            ptax: PtaxConfig::default(),
        }
    }
}

/// Builds the configured rate provider.
///
/// Unrecognized names fall back to the latest-rates provider.
pub fn build_provider(
    settings: &ProviderSettings,
    http: reqwest::Client,
    cache: Arc<dyn Cache>,
) -> Arc<dyn RateProvider> {
    let kind = ProviderKind::from_name(&settings.provider).unwrap_or_else(|| {
        warn!(
            provider = %settings.provider,
            "unknown exchange provider, falling back to exchangerate.host"
        );
        ProviderKind::LatestRates
    });

    let provider: Arc<dyn RateProvider> = match kind {
        ProviderKind::LatestRates => Arc::new(LatestRatesProvider::new(
            http,
            settings.latest_rates.clone(),
            settings.api_key.clone(),
            cache,
        )),
        ProviderKind::ConversionRates => Arc::new(ConversionRatesProvider::new(
            http,
            settings.conversion_rates.clone(),
            settings.api_key.clone(),
            cache,
        )),
        ProviderKind::Ptax => Arc::new(PtaxProvider::new(http, settings.ptax.clone(), cache)),
    };

    info!(provider = provider.name(), "exchange provider selected");
    provider
}

/// Fee configuration: a remote endpoint or a flat percent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeSettings {
    pub api_url: Option<String>,
    pub percent: f64,
}

/// Builds the fee provider, if any.
///
/// A non-empty URL wins over a positive percent; with neither, no fee applies.
pub fn build_fee_provider(
    settings: &FeeSettings,
    http: reqwest::Client,
) -> Option<Arc<dyn FeeProvider>> {
    if let Some(url) = settings.api_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        info!(url, "using remote fee provider");
        return Some(Arc::new(RemoteFee::new(http, url)));
    }
    if settings.percent > 0.0 {
        info!(percent = settings.percent, "using static fee provider");
        return Some(Arc::new(StaticFee::new(settings.percent)));
    }
    None
}
