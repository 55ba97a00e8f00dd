//! Loyalty discount rate.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when building a [`DiscountRate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountRateError {
    /// The input is not a decimal number.
    #[error("discount rate must be a number")]
    NotANumber,
    /// The rate lies outside `[0, 1]`.
    #[error("discount rate must be between 0 and 1, got {0}")]
    OutOfRange(Decimal),
}

/// A fraction of the cart total taken off at checkout, always within `[0, 1]`.
///
/// ```
/// use origami_core::DiscountRate;
/// use rust_decimal::Decimal;
///
/// let rate = DiscountRate::new(Decimal::new(10, 2)).unwrap();
/// assert_eq!(rate.to_string(), "10%");
/// assert!(DiscountRate::new(Decimal::new(15, 1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct DiscountRate(Decimal);

impl DiscountRate {
    /// No discount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Build a rate, rejecting values outside `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountRateError::OutOfRange`] when `rate < 0` or `rate > 1`.
    pub fn new(rate: Decimal) -> Result<Self, DiscountRateError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(DiscountRateError::OutOfRange(rate));
        }
        Ok(Self(rate.normalize()))
    }

    /// The rate as a fraction.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether the rate takes anything off.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The factor totals are multiplied by, `1 - rate`.
    #[must_use]
    pub fn multiplier(&self) -> Decimal {
        Decimal::ONE - self.0
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

impl FromStr for DiscountRate {
    type Err = DiscountRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rate: Decimal = s.trim().parse().map_err(|_| DiscountRateError::NotANumber)?;
        Self::new(rate)
    }
}

impl<'de> Deserialize<'de> for DiscountRate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rate = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(rate).map_err(serde::de::Error::custom)
    }
}
