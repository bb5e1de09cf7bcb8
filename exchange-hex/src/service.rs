//! Conversion Application Service
//!
//! Orchestrates a conversion through the ports: result cache, rate provider,
//! fee provider. Contains NO infrastructure logic - pure orchestration.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use exchange_types::{
    AppError, Cache, ConvertQuery, ConvertRequest, ConvertResponse, FeeBreakdown, FeeProvider,
    RateProvider,
};

/// Default TTL of cached conversion results.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Application service for currency conversion.
///
/// Generic over `C: Cache` - the result cache is injected at compile time,
/// while the rate and fee providers are chosen at runtime by the factory.
pub struct ConversionService<C: Cache> {
    cache: C,
    provider: Arc<dyn RateProvider>,
    fee: Option<Arc<dyn FeeProvider>>,
    result_ttl: Duration,
}

impl<C: Cache> ConversionService<C> {
    /// Creates a service without a fee provider.
    pub fn new(cache: C, provider: Arc<dyn RateProvider>) -> Self {
        Self {
            cache,
            provider,
            fee: None,
            result_ttl: DEFAULT_RESULT_TTL,
        }
    }

    pub fn with_fee_provider(mut self, fee: Option<Arc<dyn FeeProvider>>) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the TTL of cached results; a zero TTL keeps the default.
    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        if !ttl.is_zero() {
            self.result_ttl = ttl;
        }
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn result_ttl(&self) -> Duration {
        self.result_ttl
    }

    /// Converts the queried amount, serving repeated queries from the cache.
    #[tracing::instrument(skip(self, cancel), fields(provider = %self.provider.name()))]
    pub async fn convert(
        &self,
        cancel: &CancellationToken,
        query: ConvertQuery,
    ) -> Result<ConvertResponse, AppError> {
        let req = ConvertRequest::try_from(query)?;
        let key = req.cache_key();

        if let Some(cached) = self.cached_response(&key).await {
            debug!(key = %key, "serving cached conversion");
            return Ok(cached);
        }

        let result_cents = self
            .provider
            .convert(cancel, &req.from, &req.to, req.amount_cents)
            .await
            .inspect_err(|e| warn!(error = %e, "provider conversion failed"))?;

        let fee = self.fee_breakdown(cancel, &req, result_cents).await?;
        let response = ConvertResponse::new(&req, result_cents, fee);

        if result_cents == 0 {
            warn!(
                from = %req.from,
                to = %req.to,
                amount_cents = req.amount_cents,
                "not caching zero conversion result"
            );
        } else {
            self.store_response(&key, &response).await;
        }

        info!(
            from = %req.from,
            to = %req.to,
            amount_cents = req.amount_cents,
            result_cents,
            fee_amount_cents = response.fee_amount_cents,
            "conversion completed"
        );
        Ok(response)
    }

    async fn fee_breakdown(
        &self,
        cancel: &CancellationToken,
        req: &ConvertRequest,
        result_cents: i64,
    ) -> Result<FeeBreakdown, AppError> {
        let Some(fee) = &self.fee else {
            return Ok(FeeBreakdown::none(result_cents));
        };

        let percent = fee
            .fee_percent(cancel, &req.from, &req.to)
            .await
            .inspect_err(|e| warn!(error = %e, "fee lookup failed"))?;
        FeeBreakdown::compose(result_cents, percent).map_err(|e| {
            warn!(percent, result_cents, error = %e, "fee composition overflowed");
            AppError::BadGateway(format!("fee percent {percent} rejected: {e}"))
        })
    }

    async fn cached_response(&self, key: &str) -> Option<ConvertResponse> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                warn!(key, error = %e, "result cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cached result");
                None
            }
        }
    }

    async fn store_response(&self, key: &str, response: &ConvertResponse) {
        let raw = match serde_json::to_string(response) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize conversion result");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, &raw, self.result_ttl).await {
            warn!(key, error = %e, "result cache write failed");
        }
    }
}
