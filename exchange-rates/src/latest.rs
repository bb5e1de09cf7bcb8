//! Generic "latest rates" provider (exchangerate.host style).
//!
//! `GET {base}/latest?base=FROM[&access_key=KEY]` returns every rate anchored
//! at `FROM`; the raw body is cached per base currency.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use exchange_types::domain::money;
use exchange_types::{Cache, ConvertError, CurrencyCode, RateProvider};

use crate::http::{self, HttpSettings};
use crate::rates::{self, RatesPayload};

pub const LATEST_RATES_NAME: &str = "exchangerate.host";
pub const DEFAULT_LATEST_RATES_URL: &str = "https://api.exchangerate.host";

/// Upstream `error.type` signalling that no access key was sent.
const MISSING_ACCESS_KEY: &str = "missing_access_key";

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    rates: HashMap<String, f64>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl RatesPayload for LatestRatesResponse {
    fn into_rates(self) -> Result<HashMap<String, f64>, ConvertError> {
        if self.success {
            return Ok(self.rates);
        }

        let field = |name: &str| {
            self.error
                .as_ref()
                .and_then(|e| e.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let kind = field("type");
        let info = field("info");

        if kind.as_deref() == Some(MISSING_ACCESS_KEY) {
            return Err(ConvertError::MissingApiKey { info });
        }

        let detail = match (kind, info) {
            (Some(kind), Some(info)) => format!("{kind}: {info}"),
            (Some(kind), None) => kind,
            (None, Some(info)) => info,
            (None, None) => "upstream reported failure".to_string(),
        };
        Err(ConvertError::Unsuccessful(detail))
    }
}

/// Provider for APIs that publish a base currency with a map of rates.
pub struct LatestRatesProvider {
    http: reqwest::Client,
    settings: HttpSettings,
    api_key: Option<String>,
    cache: Arc<dyn Cache>,
}

impl LatestRatesProvider {
    pub fn new(
        http: reqwest::Client,
        settings: HttpSettings,
        api_key: Option<String>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            http,
            settings,
            api_key: api_key.filter(|k| !k.is_empty()),
            cache,
        }
    }

    async fn fetch_latest(
        &self,
        cancel: &CancellationToken,
        base: &CurrencyCode,
    ) -> Result<String, ConvertError> {
        let url = format!("{}/latest", self.settings.base_url);
        debug!(url = %url, base = %base, "exchange request");

        let mut request = self
            .http
            .get(&url)
            .timeout(self.settings.timeout)
            .query(&[("base", base.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("access_key", key.as_str())]);
        }

        http::fetch_ok(cancel, request).await.inspect_err(|e| {
            error!(provider = LATEST_RATES_NAME, error = %e, "exchange request failed");
        })
    }
}

#[async_trait]
impl RateProvider for LatestRatesProvider {
    fn name(&self) -> &str {
        LATEST_RATES_NAME
    }

    #[instrument(skip(self, cancel), fields(provider = LATEST_RATES_NAME))]
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

        let key = rates::rates_cache_key(LATEST_RATES_NAME, from);
        let rates = rates::load_rates::<LatestRatesResponse, _, _>(self.cache.as_ref(), &key, || {
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
