//! Rate source provider port.
//!
//! This trait defines the interface for upstream rate sources.
//! Implementations are HTTP clients for the individual rate APIs.

use tokio_util::sync::CancellationToken;

use crate::domain::CurrencyCode;
use crate::error::ConvertError;

/// Port trait for rate source providers.
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync {
    /// Short provider name, also used in cache keys (`rates:<name>:<BASE>`).
    fn name(&self) -> &str;

    /// Convert an amount from one currency to another.
    ///
    /// `amount` and the result are in cents. Converting a currency to itself
    /// returns `amount` unchanged without touching the network. Every
    /// outbound call and backoff sleep aborts with `ConvertError::Cancelled`
    /// once `cancel` fires.
    async fn convert(
        &self,
        cancel: &CancellationToken,
        from: &CurrencyCode,
        to: &CurrencyCode,
        amount: i64,
    ) -> Result<i64, ConvertError>;
}
