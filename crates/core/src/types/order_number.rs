//! Customer-facing order numbers.
//!
//! An order number is the token a customer quotes (together with their email)
//! to look up an order. It is a nine-digit decimal number drawn at random;
//! the order store enforces uniqueness and reports a conflict on collision.

use core::fmt;
use core::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderNumberError {
    #[error("order number cannot be empty")]
    Empty,
    #[error("order number must be {expected} digits")]
    WrongLength { expected: usize },
    #[error("order number must contain only digits")]
    NonDigit,
    #[error("order number cannot start with 0")]
    LeadingZero,
}

/// A nine-digit order number such as `482913305`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Number of digits in every order number.
    pub const DIGITS: usize = 9;

    const MIN: u32 = 100_000_000;
    const MAX: u32 = 999_999_999;

    /// Draw a fresh order number from the thread-local generator.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Draw a fresh order number from the given generator.
    pub fn generate_with<R: Rng>(rng: &mut R) -> Self {
        Self(rng.random_range(Self::MIN..=Self::MAX).to_string())
    }

    /// Parse a customer-supplied order number, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error unless the trimmed input is exactly nine ASCII digits
    /// without a leading zero.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(OrderNumberError::Empty);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::NonDigit);
        }
        if trimmed.len() != Self::DIGITS {
            return Err(OrderNumberError::WrongLength {
                expected: Self::DIGITS,
            });
        }
        if trimmed.starts_with('0') {
            return Err(OrderNumberError::LeadingZero);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_generated_numbers_are_nine_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let number = OrderNumber::generate_with(&mut rng);
            assert_eq!(number.as_str().len(), OrderNumber::DIGITS);
            assert_eq!(OrderNumber::parse(number.as_str()).unwrap(), number);
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let number = OrderNumber::parse(" 482913305 ").unwrap();
        assert_eq!(number.to_string(), "482913305");
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert_eq!(OrderNumber::parse(""), Err(OrderNumberError::Empty));
        assert_eq!(OrderNumber::parse("12345"), Err(OrderNumberError::WrongLength { expected: 9 }));
        assert_eq!(OrderNumber::parse("12345678a"), Err(OrderNumberError::NonDigit));
        assert_eq!(OrderNumber::parse("012345678"), Err(OrderNumberError::LeadingZero));
    }
}
