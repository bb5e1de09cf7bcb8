//! Cancellable HTTP plumbing shared by the providers.

use std::error::Error as StdError;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tokio_util::sync::CancellationToken;

use exchange_types::ConvertError;

/// Upstream endpoint settings owned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl HttpSettings {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

/// Formats an error together with its source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Maps a reqwest failure without its URL, which can embed the API key.
pub(crate) fn transport_error(err: reqwest::Error) -> ConvertError {
    ConvertError::Transport(error_chain(&err.without_url()))
}

/// Sends a request, aborting as soon as `cancel` fires.
pub(crate) async fn send(
    cancel: &CancellationToken,
    request: RequestBuilder,
) -> Result<Response, ConvertError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConvertError::Cancelled),
        res = request.send() => res.map_err(transport_error),
    }
}

/// Reads the full response body, aborting as soon as `cancel` fires.
pub(crate) async fn read_body(
    cancel: &CancellationToken,
    response: Response,
) -> Result<String, ConvertError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConvertError::Cancelled),
        res = response.text() => res.map_err(transport_error),
    }
}

/// Sends a request and returns the status with the full body.
pub(crate) async fn fetch(
    cancel: &CancellationToken,
    request: RequestBuilder,
) -> Result<(StatusCode, String), ConvertError> {
    let response = send(cancel, request).await?;
    let status = response.status();
    let body = read_body(cancel, response).await?;
    Ok((status, body))
}

/// Sends a request and returns the body, mapping non-2xx to `UpstreamStatus`.
pub(crate) async fn fetch_ok(
    cancel: &CancellationToken,
    request: RequestBuilder,
) -> Result<String, ConvertError> {
    let (status, body) = fetch(cancel, request).await?;
    if !status.is_success() {
        return Err(ConvertError::upstream_status(status.as_u16(), &body));
    }
    Ok(body)
}

/// Sleeps for `delay` unless `cancel` fires first.
pub(crate) async fn sleep_or_cancel(
    cancel: &CancellationToken,
    delay: Duration,
) -> Result<(), ConvertError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConvertError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
