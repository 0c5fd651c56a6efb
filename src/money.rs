//! Monetary value type
//!
//! Arbitrary-precision signed decimal with banker-safe arithmetic. All
//! financial math (prices, balances, fees, edges, conversions) flows
//! through `Money`; no binary floating-point appears in any of it.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

/// A signed decimal amount with no implied unit. Callers track the unit
/// (Ref, USD, a token) alongside the value; `Money` only guarantees
/// lossless decimal arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn from_i64(v: i64) -> Self {
        Self(Decimal::from(v))
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Round for display/storage using banker's rounding (round-half-even).
    pub fn round_display(&self, decimal_places: u32) -> Self {
        Self(self.0.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven))
    }

    /// Convert to an on-chain integer raw amount, truncating toward zero
    /// (round-down) so conversions never overspend.
    pub fn to_raw(&self, decimals: u8) -> u128 {
        let scaled = self.0 * Decimal::from(10u64.pow(decimals as u32));
        let truncated = scaled.trunc();
        truncated.to_u128().unwrap_or(0)
    }

    /// Build a `Money` from an on-chain raw integer amount.
    pub fn from_raw(raw: u128, decimals: u8) -> Self {
        let raw_dec = Decimal::from(raw);
        let divisor = Decimal::from(10u64.pow(decimals as u32));
        Self(raw_dec / divisor)
    }

    /// Basis points of `self`, e.g. `bps(30)` on 100 Ref is 0.3 Ref.
    pub fn bps_of(&self, bps: i64) -> Self {
        Self(self.0 * Decimal::from(bps) / Decimal::from(10_000))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Decimal::from_str(s)?))
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Mul for Money {
    type Output = Money;
    fn mul(self, rhs: Self) -> Self::Output {
        Money(self.0 * rhs.0)
    }
}

impl Div for Money {
    type Output = Money;
    fn div(self, rhs: Self) -> Self::Output {
        Money(self.0 / rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn roundtrip_through_raw_is_down_rounded() {
        let m = Money::new(dec!(1.23456789));
        let raw = m.to_raw(6);
        assert_eq!(raw, 1_234_567);
        let back = Money::from_raw(raw, 6);
        assert_eq!(back.inner(), dec!(1.234567));
    }

    #[test]
    fn add_then_subtract_is_identity() {
        let a = Money::new(dec!(10.5));
        let b = Money::new(dec!(3.333));
        assert_eq!((a + b) - b, a);
    }

    #[test]
    fn bps_of_computes_fraction() {
        let m = Money::new(dec!(1500));
        assert_eq!(m.bps_of(10).inner(), dec!(1.5));
    }

    #[test]
    fn string_roundtrip_is_lossless() {
        let m = Money::from_str("0.000123456789").unwrap();
        assert_eq!(m.to_string(), "0.000123456789");
    }

    #[test]
    fn no_binary_float_in_raw_conversion() {
        // A value that would lose precision under f64 round-tripping.
        let m = Money::new(dec!(0.1) + dec!(0.2));
        assert_eq!(m.inner(), dec!(0.3));
    }
}
