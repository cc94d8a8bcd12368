//! Type-safe money representation using decimal arithmetic.
//!
//! Amounts are exact decimals (`rust_decimal`), so sums and products of
//! prices never drift the way binary floats do. Rounding to presentation
//! precision happens only when a value is formatted or explicitly rounded.
//!
//! On the wire every amount is a string with exactly two decimals
//! (`"12.30"`, `"0.00"`). Raw JSON numbers are rejected.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places used for presentation.
pub const PRESENTATION_SCALE: u32 = 2;

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is not a decimal number.
    #[error("not a decimal amount: {0}")]
    Malformed(String),
    /// The input is negative.
    #[error("amount cannot be negative: {0}")]
    Negative(String),
}

/// A non-negative monetary amount in the vendor's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Parse an amount such as `"29.99"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal or is negative.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| MoneyError::Malformed(s.to_string()))?;
        Self::try_from_decimal(value).map_err(|_| MoneyError::Negative(s.to_string()))
    }

    /// Wrap a decimal value.
    ///
    /// # Errors
    ///
    /// Returns the input back if it is negative.
    pub fn try_from_decimal(value: Decimal) -> Result<Self, Decimal> {
        if value.is_sign_negative() && !value.is_zero() {
            Err(value)
        } else {
            Ok(Self(value))
        }
    }

    /// The exact, unrounded amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Round half away from zero to presentation precision.
    ///
    /// The result always carries exactly two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let mut value = self
            .0
            .round_dp_with_strategy(PRESENTATION_SCALE, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(PRESENTATION_SCALE);
        Self(value)
    }

    /// Wrap a value the caller has already proven non-negative.
    pub(crate) const fn from_non_negative(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded().0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
