//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{CurrencyCode, FeeBreakdown, money};
use crate::error::DomainError;

// ─────────────────────────────────────────────────────────────────────────────
// Conversion DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Raw conversion query as received on `/convert`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConvertQuery {
    /// Source currency code
    #[schema(example = "USD")]
    pub from: Option<String>,
    /// Target currency code
    #[schema(example = "BRL")]
    pub to: Option<String>,
    /// Integer cents (`1000`) or decimal units (`10.00`)
    #[schema(example = "1000")]
    pub amount: Option<String>,
}

/// A validated conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount_cents: i64,
}

impl ConvertRequest {
    /// Key under which the finished response is cached.
    pub fn cache_key(&self) -> String {
        format!("convert:{}:{}:{}", self.from, self.to, self.amount_cents)
    }
}

impl TryFrom<ConvertQuery> for ConvertRequest {
    type Error = DomainError;

    fn try_from(query: ConvertQuery) -> Result<Self, Self::Error> {
        let from = required(query.from, "from")?;
        let to = required(query.to, "to")?;
        let amount = required(query.amount, "amount")?;

        Ok(Self {
            from: CurrencyCode::parse(&from)?,
            to: CurrencyCode::parse(&to)?,
            amount_cents: money::parse_amount(&amount)?,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, DomainError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(DomainError::MissingParameter(name))
}

/// Result of a conversion, including the applied fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    #[schema(value_type = String, example = "USD")]
    pub from: CurrencyCode,
    #[schema(value_type = String, example = "BRL")]
    pub to: CurrencyCode,
    /// Requested amount in cents
    #[schema(example = 10000)]
    pub amount_cents: i64,
    /// Converted amount in cents, before fees
    #[schema(example = 55000)]
    pub result_cents: i64,
    /// Converted amount in major units
    #[schema(example = 550.0)]
    pub result: f64,
    /// Fee percentage applied (`0.005` = 0.5%)
    #[schema(example = 0.005)]
    pub fee_percent: f64,
    #[schema(example = 275)]
    pub fee_amount_cents: i64,
    #[schema(example = 54725)]
    pub net_result_cents: i64,
    #[schema(example = 547.25)]
    pub net_result: f64,
}

impl ConvertResponse {
    pub fn new(req: &ConvertRequest, result_cents: i64, fee: FeeBreakdown) -> Self {
        Self {
            from: req.from.clone(),
            to: req.to.clone(),
            amount_cents: req.amount_cents,
            result_cents,
            result: money::cents_to_units(result_cents),
            fee_percent: fee.fee_percent,
            fee_amount_cents: fee.fee_amount_cents,
            net_result_cents: fee.net_result_cents,
            net_result: money::cents_to_units(fee.net_result_cents),
        }
    }
}

/// Health check payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}
