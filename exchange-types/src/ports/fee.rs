//! Fee schedule port.

use tokio_util::sync::CancellationToken;

use crate::domain::CurrencyCode;
use crate::error::FeeError;

/// Returns the fee percentage for a currency pair (`0.005` = 0.5%).
///
/// Implementations that do IO must stop with `FeeError::Cancelled` once
/// `cancel` fires.
#[async_trait::async_trait]
pub trait FeeProvider: Send + Sync {
    async fn fee_percent(
        &self,
        cancel: &CancellationToken,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<f64, FeeError>;
}
