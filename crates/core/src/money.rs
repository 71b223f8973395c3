//! Money value objects: currency codes and minor-unit amounts.
//!
//! Amounts are signed integers in the currency's smallest unit (e.g. cents), so
//! ledger arithmetic never touches floating point.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// ISO-4217 style currency code (three ASCII uppercase letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> DomainResult<Self> {
        let code = code.as_ref().trim().to_ascii_uppercase();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "currency code must be three letters, got '{code}'"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl ValueObject for Currency {}

/// Projection of an amount into the ledger's base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAmount {
    pub currency: Currency,
    /// Converted value in base-currency minor units.
    pub value: i64,
    /// Units of base currency per unit of the source currency.
    pub rate: Decimal,
    pub rate_date: NaiveDate,
}

/// Signed minor-unit value with its currency.
///
/// A value never exists without a currency; the optional `base` carries the
/// same amount expressed in the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    value: i64,
    currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base: Option<BaseAmount>,
}

impl Amount {
    pub fn new(value: i64, currency: Currency) -> Self {
        Self {
            value,
            currency,
            base: None,
        }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn base(&self) -> Option<&BaseAmount> {
        self.base.as_ref()
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Same currency, different value. The base projection is dropped because
    /// it no longer describes the new value.
    pub fn with_value(&self, value: i64) -> Self {
        Self::new(value, self.currency.clone())
    }

    /// Attach a base-currency projection computed from `rate`.
    ///
    /// The converted value is rounded half away from zero to whole minor units.
    pub fn with_base(
        mut self,
        base_currency: Currency,
        rate: Decimal,
        rate_date: NaiveDate,
    ) -> DomainResult<Self> {
        if rate <= Decimal::ZERO {
            return Err(DomainError::validation("exchange rate must be positive"));
        }
        let converted = Decimal::from(self.value)
            .checked_mul(rate)
            .ok_or_else(|| DomainError::invariant("base amount overflows decimal range"))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| DomainError::invariant("base amount overflows i64"))?;
        self.base = Some(BaseAmount {
            currency: base_currency,
            value: converted,
            rate,
            rate_date,
        });
        Ok(self)
    }

    /// Add two amounts of the same currency.
    pub fn checked_add(&self, other: &Amount) -> DomainResult<Amount> {
        if self.currency != other.currency {
            return Err(DomainError::validation(format!(
                "cannot add {} to {}",
                other.currency, self.currency
            )));
        }
        let value = self
            .value
            .checked_add(other.value)
            .ok_or_else(|| DomainError::invariant("amount overflow"))?;
        Ok(self.with_value(value))
    }

    pub fn checked_neg(&self) -> DomainResult<Amount> {
        let value = self
            .value
            .checked_neg()
            .ok_or_else(|| DomainError::invariant("amount overflow"))?;
        Ok(self.with_value(value))
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

impl ValueObject for Amount {}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }

    #[test]
    fn currency_codes_are_normalized() {
        assert_eq!(Currency::new("eur").unwrap().as_str(), "EUR");
        assert!(Currency::new("EURO").is_err());
        assert!(Currency::new("U1D").is_err());
    }

    #[test]
    fn base_projection_rounds_half_away_from_zero() {
        let eur = Currency::new("EUR").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let amount = Amount::new(-105, eur)
            .with_base(usd(), Decimal::new(15, 1), date)
            .unwrap();
        let base = amount.base().unwrap();
        assert_eq!(base.value, -158);
        assert_eq!(base.currency, usd());
    }

    #[test]
    fn non_positive_rate_is_rejected() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert!(Amount::new(1, usd()).with_base(usd(), Decimal::ZERO, date).is_err());
    }

    #[test]
    fn oversized_conversions_are_errors() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let err = Amount::new(i64::MAX, usd())
            .with_base(usd(), Decimal::MAX, date)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let err = Amount::new(i64::MAX, usd())
            .with_base(usd(), Decimal::new(2, 0), date)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn adding_mismatched_currencies_fails() {
        let eur = Currency::new("EUR").unwrap();
        assert!(Amount::new(1, usd()).checked_add(&Amount::new(1, eur)).is_err());
        assert_eq!(
            Amount::new(1, usd()).checked_add(&Amount::new(2, usd())).unwrap().value(),
            3
        );
    }

    #[test]
    fn serde_rejects_invalid_currency() {
        let raw = r#"{"value":10,"currency":"dollars"}"#;
        assert!(serde_json::from_str::<Amount>(raw).is_err());
        let ok: Amount = serde_json::from_str(r#"{"value":10,"currency":"USD"}"#).unwrap();
        assert_eq!(ok, Amount::new(10, usd()));
    }
}
