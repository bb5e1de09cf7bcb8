//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio_util::sync::CancellationToken;
use utoipa::OpenApi;

use exchange_types::{AppError, Cache, ConvertQuery, HealthResponse};

use crate::ConversionService;
use crate::openapi::ApiDoc;

/// Application state shared across handlers.
pub struct AppState<C: Cache> {
    pub service: ConversionService<C>,
    /// Cancelled on shutdown; every request works on a child of it.
    pub shutdown: CancellationToken,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MissingApiKey(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("exchange provider requires an API key. Set EXCHANGE_API_KEY. ({msg})"),
            ),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Convert an amount between two currencies.
#[tracing::instrument(skip(state))]
pub async fn convert<C: Cache>(
    State(state): State<Arc<AppState<C>>>,
    Query(query): Query<ConvertQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Cancels upstream work if the client goes away and this future is dropped.
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let response = state.service.convert(&cancel, query).await?;
    Ok(Json(response))
}

/// Serves the generated OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
