//! Fixed-point cents arithmetic.
//!
//! Amounts cross every public boundary as `i64` minor units ("cents").
//! Floating point is only used as scratch space while multiplying by a rate;
//! results are rounded back with round-half-away-from-zero (`f64::round`),
//! so `0.5` becomes `1` and `-0.5` becomes `-1`.

use serde::{Deserialize, Serialize};

use crate::error::{AmountOverflow, DomainError};

/// Minor units per major unit for every supported currency.
pub const CENTS_PER_UNIT: f64 = 100.0;

/// Rounds a scratch value to the nearest whole cent, ties away from zero.
///
/// Fails instead of saturating when the value is not finite or does not fit
/// in an `i64`.
pub fn round_cents(value: f64) -> Result<i64, AmountOverflow> {
    let rounded = value.round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Ok(rounded as i64)
    } else {
        Err(AmountOverflow(value))
    }
}

/// Converts cents to major units.
pub fn cents_to_units(cents: i64) -> f64 {
    cents as f64 / CENTS_PER_UNIT
}

/// Converts major units to rounded cents.
pub fn units_to_cents(units: f64) -> Result<i64, AmountOverflow> {
    round_cents(units * CENTS_PER_UNIT)
}

/// Converts `cents` at `rate` units of target per unit of source.
pub fn apply_rate(cents: i64, rate: f64) -> Result<i64, AmountOverflow> {
    units_to_cents(cents_to_units(cents) * rate)
}

/// Converts `cents` by dividing by `rate` (units of source per unit of target).
pub fn apply_inverse_rate(cents: i64, rate: f64) -> Result<i64, AmountOverflow> {
    units_to_cents(cents_to_units(cents) / rate)
}

/// Parses a caller-supplied amount.
///
/// A value containing `.` is decimal major units (`"10.50"` -> `1050`);
/// anything else must be an integer count of cents.
pub fn parse_amount(raw: &str) -> Result<i64, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DomainError::MissingParameter("amount"));
    }

    let invalid = || DomainError::InvalidAmount(raw.to_string());
    if raw.contains('.') {
        let units: f64 = raw.parse().map_err(|_| invalid())?;
        units_to_cents(units).map_err(|_| invalid())
    } else {
        raw.parse().map_err(|_| invalid())
    }
}

/// Fee applied on top of a converted amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub fee_percent: f64,
    pub fee_amount_cents: i64,
    pub net_result_cents: i64,
}

impl FeeBreakdown {
    /// Composes a fee percentage (e.g. `0.005` = 0.5%) with a converted result.
    ///
    /// The percentage is taken as given, so a negative or huge value from a
    /// fee source can push the fee or the net amount out of range.
    pub fn compose(result_cents: i64, fee_percent: f64) -> Result<Self, AmountOverflow> {
        let fee_amount_cents = round_cents(result_cents as f64 * fee_percent)?;
        let net_result_cents = result_cents
            .checked_sub(fee_amount_cents)
            .ok_or(AmountOverflow(result_cents as f64 - fee_amount_cents as f64))?;
        Ok(Self {
            fee_percent,
            fee_amount_cents,
            net_result_cents,
        })
    }

    /// No fee configured.
    pub fn none(result_cents: i64) -> Self {
        Self {
            fee_percent: 0.0,
            fee_amount_cents: 0,
            net_result_cents: result_cents,
        }
    }
}
