//! Error types for the conversion engine.

use crate::domain::CurrencyCode;

/// Upstream bodies quoted in errors are cut to this many characters.
pub const BODY_SNIPPET_LEN: usize = 512;

/// Truncates an upstream body for inclusion in an error message.
pub fn body_snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

fn info_suffix(info: &Option<String>) -> String {
    info.as_deref().map(|i| format!(": {i}")).unwrap_or_default()
}

/// Input validation errors.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
}

/// A cents computation left the range an `i64` can hold.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("amount {0} is outside the representable cents range")]
pub struct AmountOverflow(pub f64);

/// Errors returned by a rate source provider.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Network, DNS or timeout failure talking to the upstream.
    #[error("exchange request error: {0}")]
    Transport(String),

    #[error("exchange request failed status={status} body={body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("decode exchange response error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The upstream rejected the request for lack of a valid API key.
    #[error("missing exchange provider API key{}", info_suffix(.info))]
    MissingApiKey { info: Option<String> },

    #[error("exchange response not successful: {0}")]
    Unsuccessful(String),

    #[error("currency {0} not found in exchange rates")]
    CurrencyNotFound(CurrencyCode),

    #[error("no bcb rate found for {currency} in last {days} days")]
    RateWindowExhausted { currency: CurrencyCode, days: u32 },

    #[error("invalid rate {rate} for currency {currency}")]
    InvalidRate { currency: CurrencyCode, rate: f64 },

    #[error("conversion result out of range: {0}")]
    Overflow(#[from] AmountOverflow),

    #[error("conversion cancelled")]
    Cancelled,
}

impl ConvertError {
    /// Builds an upstream status error, truncating the body.
    pub fn upstream_status(status: u16, body: &str) -> Self {
        ConvertError::UpstreamStatus {
            status,
            body: body_snippet(body),
        }
    }

    /// Missing-key error carrying the upstream's explanation.
    pub fn missing_api_key(info: impl Into<String>) -> Self {
        ConvertError::MissingApiKey {
            info: Some(info.into()),
        }
    }
}

/// Errors returned by a fee provider.
#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    #[error("fee api request error: {0}")]
    Transport(String),

    #[error("fee api returned status={status} body={body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("fee api decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("fee lookup cancelled")]
    Cancelled,
}

/// Errors returned by a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache error: {0}")]
    Backend(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The configured provider needs an API key it does not have.
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<ConvertError> for AppError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::MissingApiKey { .. } => AppError::MissingApiKey(err.to_string()),
            ConvertError::Overflow(_) => AppError::BadRequest(err.to_string()),
            ConvertError::UpstreamStatus { .. }
            | ConvertError::Decode(_)
            | ConvertError::Unsuccessful(_)
            | ConvertError::CurrencyNotFound(_)
            | ConvertError::InvalidRate { .. } => AppError::BadGateway(err.to_string()),
            ConvertError::Transport(_)
            | ConvertError::RateWindowExhausted { .. }
            | ConvertError::Cancelled => AppError::Unavailable(err.to_string()),
        }
    }
}

impl From<FeeError> for AppError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::Cancelled => AppError::Unavailable(err.to_string()),
            _ => AppError::BadGateway(err.to_string()),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Internal(err.to_string())
    }
}
