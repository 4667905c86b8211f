//! Fixed-precision money arithmetic on integer minor units.

use finance_core::error::AppError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;

/// A monetary amount held as integer minor units (paise/cents) plus a
/// currency code. Never a binary float. Derived amounts are rounded
/// half-up to two decimal places at the point they are produced; sums
/// accumulate exactly in minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    minor: i64,
    currency: String,
}

impl Money {
    /// Build from a major-unit decimal amount, e.g. `from_major(1242.50, "INR")`.
    pub fn from_major(amount: Decimal, currency: impl Into<String>) -> Self {
        let minor = (amount * Decimal::from(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Self {
            // Saturates far outside any representable document total.
            minor: minor.to_i64().unwrap_or(i64::MAX),
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self {
            minor: 0,
            currency: currency.into(),
        }
    }

    pub fn minor_units(&self) -> i64 {
        self.minor
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// The amount in major units, always at scale 2.
    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.minor, 2)
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    pub fn is_negative(&self) -> bool {
        self.minor < 0
    }

    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    fn check_currency(&self, other: &Money) -> Result<(), AppError> {
        if self.currency != other.currency {
            return Err(AppError::CurrencyMismatch {
                expected: self.currency.clone(),
                found: other.currency.clone(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Money) -> Result<Money, AppError> {
        self.check_currency(other)?;
        Ok(Money {
            minor: self.minor + other.minor,
            currency: self.currency.clone(),
        })
    }

    pub fn subtract(&self, other: &Money) -> Result<Money, AppError> {
        self.check_currency(other)?;
        Ok(Money {
            minor: self.minor - other.minor,
            currency: self.currency.clone(),
        })
    }

    /// Multiply by a scalar (e.g. a quantity), rounding half-up to minor units.
    pub fn multiply(&self, scalar: Decimal) -> Money {
        let minor = (Decimal::from(self.minor) * scalar)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Money {
            minor: minor.to_i64().unwrap_or(i64::MAX),
            currency: self.currency.clone(),
        }
    }

    /// `percent` of this amount (e.g. `percent_of(18)` for an 18% tax),
    /// rounded half-up to minor units.
    pub fn percent_of(&self, percent: Decimal) -> Money {
        let minor = (Decimal::from(self.minor) * percent / Decimal::from(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Money {
            minor: minor.to_i64().unwrap_or(i64::MAX),
            currency: self.currency.clone(),
        }
    }

    pub fn compare(&self, other: &Money) -> Result<Ordering, AppError> {
        self.check_currency(other)?;
        Ok(self.minor.cmp(&other.minor))
    }
}

#[derive(Serialize, Deserialize)]
struct MoneyRepr {
    amount: Decimal,
    currency: String,
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MoneyRepr {
            amount: self.to_major(),
            currency: self.currency.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = MoneyRepr::deserialize(deserializer)?;
        Ok(Money::from_major(repr.amount, repr.currency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn from_major_rounds_half_up() {
        assert_eq!(Money::from_major(dec("1.005"), "INR").minor_units(), 101);
        assert_eq!(Money::from_major(dec("1.004"), "INR").minor_units(), 100);
        assert_eq!(Money::from_major(dec("-1.005"), "INR").minor_units(), -101);
    }

    #[test]
    fn percent_of_rounds_at_output() {
        let base = Money::from_major(dec("900.00"), "INR");
        assert_eq!(base.percent_of(dec("18")).to_major(), dec("162.00"));

        let odd = Money::from_major(dec("0.01"), "INR");
        // 0.01 * 50% = 0.005, rounds up to 0.01
        assert_eq!(odd.percent_of(dec("50")).minor_units(), 1);
    }

    #[test]
    fn mixed_currency_operations_fail() {
        let a = Money::from_major(dec("10"), "INR");
        let b = Money::from_major(dec("10"), "USD");
        assert!(matches!(
            a.add(&b),
            Err(AppError::CurrencyMismatch { .. })
        ));
        assert!(matches!(
            a.subtract(&b),
            Err(AppError::CurrencyMismatch { .. })
        ));
        assert!(matches!(
            a.compare(&b),
            Err(AppError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn sums_accumulate_without_drift() {
        let cent = Money::from_major(dec("0.01"), "INR");
        let mut total = Money::zero("INR");
        for _ in 0..1000 {
            total = total.add(&cent).unwrap();
        }
        assert_eq!(total.to_major(), dec("10.00"));
    }

    #[test]
    fn serde_round_trip() {
        let m = Money::from_major(dec("2242.00"), "INR");
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"amount":"2242.00","currency":"INR"}"#);
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
