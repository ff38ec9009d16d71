//! Lossless decimal type for token quantities and USD values.
//!
//! Sums stay exact; division rounds at rust_decimal's 28 significant digits.
//! Operators saturate at rust_decimal's bounds instead of panicking; inputs
//! are range-checked with [`Decimal::checked_mul`] before they are summed.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal used for every quantity, price and P&L figure.
///
/// Serializes to a JSON number by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a plain decimal string ("12.5", "-0.001").
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s.trim()).map(Decimal)
    }

    /// Parse plain or scientific notation ("1e-5"), as produced when JSON
    /// floats are rendered back to text.
    pub fn parse_lenient(s: &str) -> Result<Self, rust_decimal::Error> {
        let s = s.trim();
        if s.contains(['e', 'E']) {
            RustDecimal::from_scientific(s).map(Decimal)
        } else {
            RustDecimal::from_str(s).map(Decimal)
        }
    }

    /// Canonical string form: trailing zeros stripped, never an exponent.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }

    pub fn hundred() -> Self {
        Decimal(RustDecimal::ONE_HUNDRED)
    }

    pub fn from_i64(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Strictly less than zero.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// `self / denominator`, or `None` when the denominator is zero or the
    /// quotient overflows.
    pub fn checked_div(&self, denominator: Decimal) -> Option<Decimal> {
        self.0.checked_div(denominator.0).map(Decimal)
    }

    /// `self * rhs`, or `None` on overflow.
    pub fn checked_mul(&self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }

    /// `self + rhs`, or `None` on overflow.
    pub fn checked_add(&self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_add(rhs.0).map(Decimal)
    }

    /// `self / denominator`, falling back to zero when undefined.
    pub fn div_or_zero(&self, denominator: Decimal) -> Decimal {
        self.checked_div(denominator).unwrap_or_default()
    }

    /// `self / denominator * 100`, `None` when the denominator is zero.
    pub fn percent_of(&self, denominator: Decimal) -> Option<Decimal> {
        self.checked_div(denominator).map(|ratio| ratio * Decimal::hundred())
    }

    /// Round half away from zero to `dp` decimal places.
    pub fn round_dp(&self, dp: u32) -> Decimal {
        Decimal(self.0.round_dp_with_strategy(
            dp,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        ))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0.saturating_mul(rhs.0))
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}

/// Serde helpers for wire DTOs that accept either a JSON string or a JSON
/// number. Numbers are re-read from their textual form so `0.1` stays `0.1`.
pub mod lenient {
    use super::Decimal;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    fn parse<E: serde::de::Error>(raw: Raw) -> Result<Decimal, E> {
        let text = match raw {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        Decimal::parse_lenient(&text)
            .map_err(|e| E::custom(format!("invalid decimal {:?}: {}", text, e)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse(Raw::deserialize(deserializer)?)
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<Raw>::deserialize(deserializer)? {
                Some(raw) => parse(raw).map(Some),
                None => Ok(None),
            }
        }
    }
}

/// Deserialize a `HashMap<String, Decimal>` leniently (string or number
/// values).
pub fn deserialize_price_map<'de, D>(
    deserializer: D,
) -> Result<std::collections::HashMap<String, Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(with = "lenient")] Decimal);

    let raw = Option::<std::collections::HashMap<String, Wrapped>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, Wrapped(v))| (k, v))
        .collect())
}
