//! OpenAPI document generation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use exchange_types::dto::{ConvertQuery, ConvertResponse, HealthResponse};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse, example = json!({"status": "ok"}))
    )
)]
async fn health() {}

/// Convert an amount between two currencies
///
/// `amount` is integer cents (`1000` = 10.00) unless it contains a `.`, in
/// which case it is read as decimal units. Results are cached per
/// `(from, to, amount)` for the configured TTL.
#[utoipa::path(
    get,
    path = "/convert",
    tag = "convert",
    params(ConvertQuery),
    responses(
        (status = 200, description = "Conversion result with fee breakdown", body = ConvertResponse),
        (status = 400, description = "Missing or invalid parameter", body = inline(serde_json::Value), example = json!({"error": "Missing parameter: amount", "code": 400})),
        (status = 502, description = "Upstream rejected the request, returned bad data, or the API key is missing"),
        (status = 503, description = "Upstream unreachable, no quote in the lookback window, or request cancelled")
    )
)]
async fn convert() {}

/// OpenAPI documentation for the conversion API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Currency Conversion API",
        version = "1.0.0",
        description = "Converts integer-cent amounts between currencies using a configurable upstream rate provider (exchangerate.host, exchangerate-api.com or the Central Bank of Brazil PTAX bulletin), with optional fee composition.",
        license(name = "MIT"),
    ),
    paths(health, convert),
    components(schemas(ConvertResponse, HealthResponse)),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "convert", description = "Currency conversion"),
    )
)]
pub struct ApiDoc;
