//! Currency-aware fixed-point amounts stored as signed minor units (cents).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MINOR_UNITS: i64 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid currency code `{0}`")]
    InvalidCurrency(String),
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },
    #[error("money value is uninitialized")]
    Uninitialized,
    #[error("money arithmetic overflowed")]
    Overflow,
}

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Result<Self, MoneyError> {
        let code = code.into();
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.len() != 3 || !normalized.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(MoneyError::InvalidCurrency(code));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(code: String) -> Result<Self, MoneyError> {
        Self::new(code)
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self("USD".into())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signed amount tagged with its currency.
///
/// `Money::default()` is the uninitialized value: every arithmetic, comparison
/// and sign query on it fails with [`MoneyError::Uninitialized`]. Operations on
/// two values fail with [`MoneyError::CurrencyMismatch`] when the currencies
/// differ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currency: Option<CurrencyCode>,
}

impl Money {
    pub fn new(cents: i64, currency: &CurrencyCode) -> Self {
        Self {
            cents,
            currency: Some(currency.clone()),
        }
    }

    pub fn from_code(cents: i64, code: &str) -> Result<Self, MoneyError> {
        Ok(Self::new(cents, &CurrencyCode::new(code)?))
    }

    pub fn zero(currency: &CurrencyCode) -> Self {
        Self::new(0, currency)
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn currency(&self) -> Option<&CurrencyCode> {
        self.currency.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.currency.is_some()
    }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        let currency = self.shared_currency(other)?;
        let cents = self
            .cents
            .checked_add(other.cents)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(cents, currency))
    }

    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        let currency = self.shared_currency(other)?;
        let cents = self
            .cents
            .checked_sub(other.cents)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(cents, currency))
    }

    pub fn greater_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.shared_currency(other)?;
        Ok(self.cents > other.cents)
    }

    pub fn less_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.shared_currency(other)?;
        Ok(self.cents < other.cents)
    }

    pub fn equals(&self, other: &Money) -> Result<bool, MoneyError> {
        self.shared_currency(other)?;
        Ok(self.cents == other.cents)
    }

    pub fn is_zero(&self) -> Result<bool, MoneyError> {
        self.initialized_currency()?;
        Ok(self.cents == 0)
    }

    pub fn is_positive(&self) -> Result<bool, MoneyError> {
        self.initialized_currency()?;
        Ok(self.cents > 0)
    }

    pub fn is_negative(&self) -> Result<bool, MoneyError> {
        self.initialized_currency()?;
        Ok(self.cents < 0)
    }

    /// Adds every item to a zero of `currency`.
    pub fn sum<'a, I>(currency: &CurrencyCode, items: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, item| acc.add(item))
    }

    fn initialized_currency(&self) -> Result<&CurrencyCode, MoneyError> {
        self.currency.as_ref().ok_or(MoneyError::Uninitialized)
    }

    fn shared_currency(&self, other: &Money) -> Result<&CurrencyCode, MoneyError> {
        let left = self.initialized_currency()?;
        let right = other.initialized_currency()?;
        if left != right {
            return Err(MoneyError::CurrencyMismatch {
                left: left.to_string(),
                right: right.to_string(),
            });
        }
        Ok(left)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        let minor = MINOR_UNITS as u64;
        write!(f, "{sign}{}.{:02}", abs / minor, abs % minor)?;
        if let Some(currency) = &self.currency {
            write!(f, " {currency}")?;
        }
        Ok(())
    }
}
