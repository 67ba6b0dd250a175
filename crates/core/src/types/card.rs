//! Payment card types.
//!
//! Only the card number and expiry are kept. Card verification codes are
//! never accepted or stored.

use core::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing card details.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    /// The card number is empty.
    #[error("card number cannot be empty")]
    Empty,
    /// The card number contains something other than digits and spaces.
    #[error("card number must contain only digits")]
    NonDigit,
    /// The card number has the wrong number of digits.
    #[error("card number must have between {min} and {max} digits")]
    InvalidLength {
        /// Minimum number of digits.
        min: usize,
        /// Maximum number of digits.
        max: usize,
    },
    /// The card number fails the Luhn checksum.
    #[error("card number checksum is invalid")]
    Checksum,
    /// The expiry month is outside 1-12.
    #[error("expiry month must be between 1 and 12")]
    InvalidMonth,
    /// The card expired before the current month.
    #[error("card has expired")]
    Expired,
}

/// A payment card number (PAN).
///
/// Spaces are stripped on parse. The `Debug` and `Display` output only ever
/// shows the last four digits.
///
/// ## Examples
///
/// ```
/// use bookstore_core::CardNumber;
///
/// let card = CardNumber::parse("4111 1111 1111 1111").unwrap();
/// assert_eq!(card.last_four(), "1111");
/// assert_eq!(card.masked(), "************1111");
///
/// assert!(CardNumber::parse("4111111111111112").is_err()); // checksum
/// assert!(CardNumber::parse("not-a-card").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardNumber(String);

impl CardNumber {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 12;
    /// Maximum number of digits.
    pub const MAX_DIGITS: usize = 19;

    /// Parse a card number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains non-digit characters,
    /// has fewer than 12 or more than 19 digits, or fails the Luhn check.
    pub fn parse(s: &str) -> Result<Self, CardError> {
        let digits: String = s.chars().filter(|c| *c != ' ').collect();

        if digits.is_empty() {
            return Err(CardError::Empty);
        }

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CardError::NonDigit);
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(CardError::InvalidLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        if !luhn_valid(&digits) {
            return Err(CardError::Checksum);
        }

        Ok(Self(digits))
    }

    /// Returns the full card number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last four digits.
    #[must_use]
    pub fn last_four(&self) -> &str {
        let start = self.0.len().saturating_sub(4);
        self.0.get(start..).unwrap_or_default()
    }

    /// Returns the number with every digit but the last four replaced by `*`.
    #[must_use]
    pub fn masked(&self) -> String {
        let hidden = self.0.len().saturating_sub(4);
        format!("{}{}", "*".repeat(hidden), self.last_four())
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CardNumber").field(&self.masked()).finish()
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl TryFrom<String> for CardNumber {
    type Error = CardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CardNumber> for String {
    fn from(card: CardNumber) -> Self {
        card.0
    }
}

/// Luhn (mod 10) checksum over an all-digit string.
fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Card expiry (month and four-digit year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExpiry {
    /// Month, 1-12.
    pub month: u32,
    /// Four-digit year.
    pub year: i32,
}

impl CardExpiry {
    /// Validate an expiry against a reference date.
    ///
    /// A card is valid through the last day of its expiry month.
    ///
    /// # Errors
    ///
    /// Returns `CardError::InvalidMonth` if the month is outside 1-12 and
    /// `CardError::Expired` if the expiry month is before `today`'s month.
    pub fn parse(month: u32, year: i32, today: chrono::NaiveDate) -> Result<Self, CardError> {
        if !(1..=12).contains(&month) {
            return Err(CardError::InvalidMonth);
        }

        if (year, month) < (today.year(), today.month()) {
            return Err(CardError::Expired);
        }

        Ok(Self { month, year })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_strips_spaces() {
        let card = CardNumber::parse("4111 1111 1111 1111").unwrap();
        assert_eq!(card.as_str(), "4111111111111111");
    }

    #[test]
    fn test_parse_rejects_letters() {
        assert_eq!(CardNumber::parse("4111-1111"), Err(CardError::NonDigit));
    }

    #[test]
    fn test_parse_rejects_short_numbers() {
        assert!(matches!(
            CardNumber::parse("4242"),
            Err(CardError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        assert_eq!(
            CardNumber::parse("4111111111111112"),
            Err(CardError::Checksum)
        );
    }

    #[test]
    fn test_debug_is_masked() {
        let card = CardNumber::parse("5555555555554444").unwrap();
        let debug = format!("{card:?}");
        assert!(debug.contains("4444"));
        assert!(!debug.contains("5555555555554444"));
    }

    #[test]
    fn test_expiry_current_month_is_valid() {
        assert!(CardExpiry::parse(3, 2026, date(2026, 3, 31)).is_ok());
    }

    #[test]
    fn test_expiry_previous_month_is_expired() {
        assert_eq!(
            CardExpiry::parse(2, 2026, date(2026, 3, 1)),
            Err(CardError::Expired)
        );
    }

    #[test]
    fn test_expiry_month_out_of_range() {
        assert_eq!(
            CardExpiry::parse(13, 2030, date(2026, 3, 1)),
            Err(CardError::InvalidMonth)
        );
    }
}
