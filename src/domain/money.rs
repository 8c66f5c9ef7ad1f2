use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// An amount of store currency (MMK), in whole units.
///
/// Balances, prices and top-up amounts are all integers; this wrapper keeps
/// them from being mixed up with ids or counts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Self = Self(0);

    pub fn new(units: i64) -> Self {
        Self(units)
    }

    pub fn units(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// `percent`% of this amount, truncated towards zero.
    pub fn percent(&self, percent: Decimal) -> Money {
        let share = Decimal::from(self.0) * percent / Decimal::ONE_HUNDRED;
        Money(share.trunc().to_i64().unwrap_or(0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MMK", self.0)
    }
}

impl From<i64> for Money {
    fn from(units: i64) -> Self {
        Self(units)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(5000);
        let b = Money::new(950);
        assert_eq!(a - b, Money::new(4050));
        assert_eq!(a + b, Money::new(5950));
        assert_eq!(-b, Money::new(-950));
    }

    #[test]
    fn test_checked_arithmetic_at_limits() {
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
        assert_eq!(Money::new(i64::MIN).checked_sub(Money::new(1)), None);
        assert_eq!(
            Money::new(5000).checked_sub(Money::new(950)),
            Some(Money::new(4050))
        );
    }

    #[test]
    fn test_percent_truncates() {
        assert_eq!(Money::new(5000).percent(dec!(3)), Money::new(150));
        assert_eq!(Money::new(1999).percent(dec!(3)), Money::new(59));
        assert_eq!(Money::new(1000).percent(dec!(2.5)), Money::new(25));
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(Money::new(5100).to_string(), "5100 MMK");
        let json = serde_json::to_string(&Money::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
