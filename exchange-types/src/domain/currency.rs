//! ISO-style currency codes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// A three-letter currency code, always stored uppercase.
///
/// Codes are compared case-insensitively by normalizing on construction:
/// `"brl"`, `"Brl"` and `"BRL"` all parse to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// The Brazilian real, pivot currency of the PTAX series.
    pub const BRL: &'static str = "BRL";

    /// Parses and normalizes a currency code.
    pub fn parse(code: &str) -> Result<Self, DomainError> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Shorthand for the BRL pivot code.
    pub fn brl() -> Self {
        Self(Self::BRL.to_string())
    }

    /// Returns the uppercase code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the BRL pivot currency.
    pub fn is_brl(&self) -> bool {
        self.0 == Self::BRL
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
