//! Monetary amounts in minor currency units
//!
//! Every price in the engine is an integer number of cents. Arithmetic never
//! goes through floating point, including percentage discounts which are
//! truncated towards zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// An amount of money expressed in cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create an amount from a number of cents
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Zero amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Raw number of cents
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Multiply a unit price by a quantity
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * i64::from(quantity))
    }

    /// Percentage of this amount, truncated (never rounded up)
    ///
    /// `Money::from_cents(999).percent_floor(10)` is `99`, not `100`.
    pub fn percent_floor(self, percent: u32) -> Self {
        Self(self.0 * i64::from(percent) / 100)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02} €", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_floor_truncates() {
        assert_eq!(Money::from_cents(999).percent_floor(10).cents(), 99);
        assert_eq!(Money::from_cents(1000).percent_floor(10).cents(), 100);
        assert_eq!(Money::from_cents(5).percent_floor(10).cents(), 0);
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Money::from_cents(3550);
        assert_eq!(unit.times(12).cents(), 42_600);

        let total: Money = [Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(350));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1090).to_string(), "10.90 €");
        assert_eq!(Money::from_cents(5).to_string(), "0.05 €");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50 €");
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_value(Money::from_cents(500)).unwrap();
        assert_eq!(json, serde_json::json!(500));
    }
}
