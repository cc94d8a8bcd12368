//! Per-vendor tax rate.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`TaxRate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxRateError {
    /// The input is not a decimal number.
    #[error("not a decimal tax rate: {0}")]
    Malformed(String),
    /// The rate is below 0% or above 100%.
    #[error("tax rate must be between 0 and 1 (0% and 100%), got {0}")]
    OutOfRange(String),
}

/// A tax rate expressed as a fraction (`0.08` is 8%).
///
/// ## Examples
///
/// ```
/// use vendorcart_core::TaxRate;
///
/// assert_eq!(TaxRate::parse("0.08").unwrap(), TaxRate::parse("8%").unwrap());
/// assert!(TaxRate::parse("1.5").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// A zero rate, for vendors configured as tax-exempt.
    pub const EXEMPT: Self = Self(Decimal::ZERO);

    /// Parse a fraction (`"0.08"`) or a percentage (`"8%"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal or falls outside 0..=1.
    pub fn parse(s: &str) -> Result<Self, TaxRateError> {
        let trimmed = s.trim();
        let (digits, percent) = trimmed
            .strip_suffix('%')
            .map_or((trimmed, false), |d| (d.trim_end(), true));

        let mut value =
            Decimal::from_str(digits).map_err(|_| TaxRateError::Malformed(s.to_string()))?;
        if percent {
            value /= Decimal::ONE_HUNDRED;
        }
        Self::from_fraction(value).map_err(|_| TaxRateError::OutOfRange(s.to_string()))
    }

    /// Wrap a fraction in `0..=1`.
    ///
    /// # Errors
    ///
    /// Returns the input back if it is out of range.
    pub fn from_fraction(value: Decimal) -> Result<Self, Decimal> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            Err(value)
        } else {
            Ok(Self(value.normalize()))
        }
    }

    /// The rate as a fraction.
    #[must_use]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxRate {
    type Err = TaxRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TaxRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaxRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
