//! Fee providers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use exchange_types::error::body_snippet;
use exchange_types::{ConvertError, CurrencyCode, FeeError, FeeProvider};

use crate::http;

/// Timeout for a remote fee lookup.
pub const FEE_TIMEOUT: Duration = Duration::from_secs(5);

/// A fixed fee percent for every pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticFee {
    percent: f64,
}

impl StaticFee {
    pub fn new(percent: f64) -> Self {
        Self { percent }
    }
}

#[async_trait]
impl FeeProvider for StaticFee {
    async fn fee_percent(
        &self,
        _cancel: &CancellationToken,
        _from: &CurrencyCode,
        _to: &CurrencyCode,
    ) -> Result<f64, FeeError> {
        Ok(self.percent)
    }
}

#[derive(Debug, Deserialize)]
struct FeeApiResponse {
    percent: f64,
}

/// Looks the fee up per pair with `GET {url}?from=X&to=Y`.
///
/// The endpoint answers `{"percent": 0.01}`.
pub struct RemoteFee {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl RemoteFee {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            timeout: FEE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `http::fetch` only fails with `Transport` or `Cancelled`.
fn request_error(err: ConvertError) -> FeeError {
    let err = match err {
        ConvertError::Cancelled => FeeError::Cancelled,
        ConvertError::Transport(message) => FeeError::Transport(message),
        other => FeeError::Transport(other.to_string()),
    };
    error!(error = %err, "fee api request failed");
    err
}

#[async_trait]
impl FeeProvider for RemoteFee {
    async fn fee_percent(
        &self,
        cancel: &CancellationToken,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<f64, FeeError> {
        let request = self
            .http
            .get(&self.url)
            .timeout(self.timeout)
            .query(&[("from", from.as_str()), ("to", to.as_str())]);
        let (status, body) = http::fetch(cancel, request).await.map_err(request_error)?;

        if !status.is_success() {
            error!(status = status.as_u16(), "fee api returned error status");
            return Err(FeeError::UpstreamStatus {
                status: status.as_u16(),
                body: body_snippet(&body),
            });
        }

        let parsed: FeeApiResponse = serde_json::from_str(&body)
            .inspect_err(|e| error!(error = %e, "fee api decode failed"))?;
        debug!(percent = parsed.percent, "fee api percent");
        Ok(parsed.percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fee_ignores_pair() {
        let fee = StaticFee::new(0.005);
        let cancel = CancellationToken::new();
        let usd = CurrencyCode::parse("USD").unwrap();
        let eur = CurrencyCode::parse("EUR").unwrap();

        assert_eq!(fee.fee_percent(&cancel, &usd, &CurrencyCode::brl()).await.unwrap(), 0.005);
        assert_eq!(fee.fee_percent(&cancel, &eur, &usd).await.unwrap(), 0.005);
    }

    #[test]
    fn test_fee_api_response_shape() {
        let parsed: FeeApiResponse = serde_json::from_str(r#"{"percent":0.01}"#).unwrap();
        assert_eq!(parsed.percent, 0.01);
        assert!(serde_json::from_str::<FeeApiResponse>(r#"{"fee":1}"#).is_err());
    }
}
