//! Keyed "conversion rates" provider (exchangerate-api.com style).
//!
//! The API key is part of the path: `GET {base}/{key}/latest/{FROM}`. The
//! upstream reports invalid keys through a non-`success` `result` field.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use exchange_types::domain::money;
use exchange_types::{Cache, ConvertError, CurrencyCode, RateProvider};

use crate::http::{self, HttpSettings};
use crate::rates::{self, RatesPayload};

pub const CONVERSION_RATES_NAME: &str = "exchangerate-api";
pub const DEFAULT_CONVERSION_RATES_URL: &str = "https://v6.exchangerate-api.com/v6";

#[derive(Debug, Deserialize)]
struct ConversionRatesResponse {
    #[serde(default)]
    result: String,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
}

impl RatesPayload for ConversionRatesResponse {
    fn into_rates(self) -> Result<HashMap<String, f64>, ConvertError> {
        if self.result == "success" {
            return Ok(self.conversion_rates);
        }

        let mut info = format!("upstream returned non-success result {:?}", self.result);
        if let Some(kind) = self.error_type {
            info.push_str(&format!(" ({kind})"));
        }
        Err(ConvertError::missing_api_key(info))
    }
}

/// Builds `{base_url}/{key}/latest/{base}` with every segment percent-encoded.
fn latest_url(base_url: &str, api_key: &str, base: &CurrencyCode) -> Result<Url, ConvertError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ConvertError::Transport(format!("invalid exchange base url: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| {
            ConvertError::Transport(format!("exchange base url {base_url} cannot hold a path"))
        })?
        .pop_if_empty()
        .extend([api_key, "latest", base.as_str()]);
    Ok(url)
}

/// Provider for rate APIs that authenticate with a key embedded in the path.
pub struct ConversionRatesProvider {
    http: reqwest::Client,
    settings: HttpSettings,
    api_key: String,
    cache: Arc<dyn Cache>,
}

impl ConversionRatesProvider {
    pub fn new(
        http: reqwest::Client,
        settings: HttpSettings,
        api_key: Option<String>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            http,
            settings,
            api_key: api_key.unwrap_or_default(),
            cache,
        }
    }

    async fn fetch_latest(
        &self,
        cancel: &CancellationToken,
        base: &CurrencyCode,
    ) -> Result<String, ConvertError> {
        debug!(base = %base, "exchange request");
        let url = latest_url(&self.settings.base_url, &self.api_key, base)?;
        let request = self.http.get(url).timeout(self.settings.timeout);

        http::fetch_ok(cancel, request).await.inspect_err(|e| {
            error!(provider = CONVERSION_RATES_NAME, error = %e, "exchange request failed");
        })
    }
}

#[async_trait]
impl RateProvider for ConversionRatesProvider {
    fn name(&self) -> &str {
        CONVERSION_RATES_NAME
    }

    #[instrument(skip(self, cancel), fields(provider = CONVERSION_RATES_NAME))]
    async fn convert(
        &self,
        cancel: &CancellationToken,
        from: &CurrencyCode,
        to: &CurrencyCode,
        amount: i64,
    ) -> Result<i64, ConvertError> {
        if from == to {
            return Ok(amount);
        }
        if self.api_key.is_empty() {
            return Err(ConvertError::missing_api_key(
                "api key not provided for exchangerate-api",
            ));
        }

        let key = rates::rates_cache_key(CONVERSION_RATES_NAME, from);
        let rates =
            rates::load_rates::<ConversionRatesResponse, _, _>(self.cache.as_ref(), &key, || {
                self.fetch_latest(cancel, from)
            })
            .await
            .inspect_err(|e| error!(error = %e, "exchange response rejected"))?;

        let rate = rates::pick_rate(&rates, to)?;
        let result = money::apply_rate(amount, rate)?;
        debug!(rate, result, "exchange convert computed");
        Ok(result)
    }
}
