//! Raw-response caching shared by the "base currency -> rate map" providers.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use exchange_types::{Cache, ConvertError, CurrencyCode};

/// TTL of cached raw upstream bodies, independent of the result cache TTL.
pub const RAW_RATES_TTL: Duration = Duration::from_secs(20 * 60);

/// Cache key for a provider's raw rates anchored at `base`.
pub fn rates_cache_key(provider: &str, base: &CurrencyCode) -> String {
    format!("rates:{}:{}", provider, base)
}

/// Reads a cached body; backend errors count as a miss.
pub(crate) async fn cached_body(cache: &dyn Cache, key: &str) -> Option<String> {
    match cache.get(key).await {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            warn!(key, error = %e, "cache read failed, treating as miss");
            None
        }
    }
}

/// Stores a body; backend errors are logged and otherwise ignored.
pub(crate) async fn store_body(cache: &dyn Cache, key: &str, body: &str) {
    if let Err(e) = cache.set(key, body, RAW_RATES_TTL).await {
        warn!(key, error = %e, "cache write failed");
    }
}

/// An upstream payload that yields a rate map or a provider-specific failure.
pub(crate) trait RatesPayload: DeserializeOwned {
    fn into_rates(self) -> Result<HashMap<String, f64>, ConvertError>;
}

fn decode_rates<P: RatesPayload>(body: &str) -> Result<HashMap<String, f64>, ConvertError> {
    serde_json::from_str::<P>(body)?.into_rates()
}

/// Returns the rate map for `key`, from cache or from `fetch`.
///
/// Only bodies that decode and report success are written back, so failure
/// payloads are never served from cache.
pub(crate) async fn load_rates<P, F, Fut>(
    cache: &dyn Cache,
    key: &str,
    fetch: F,
) -> Result<HashMap<String, f64>, ConvertError>
where
    P: RatesPayload,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, ConvertError>>,
{
    if let Some(body) = cached_body(cache, key).await {
        match decode_rates::<P>(&body) {
            Ok(rates) => {
                debug!(key, "using cached rates");
                return Ok(rates);
            }
            Err(e) => warn!(key, error = %e, "discarding unusable cached rates"),
        }
    }

    let body = fetch().await?;
    let rates = decode_rates::<P>(&body)?;
    store_body(cache, key, &body).await;
    Ok(rates)
}

/// Looks up the target currency in a rate map.
pub(crate) fn pick_rate(
    rates: &HashMap<String, f64>,
    to: &CurrencyCode,
) -> Result<f64, ConvertError> {
    rates
        .get(to.as_str())
        .copied()
        .ok_or_else(|| ConvertError::CurrencyNotFound(to.clone()))
}
