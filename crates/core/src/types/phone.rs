//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone cannot be empty")]
    Empty,
    /// The input string contains no digits at all.
    #[error("phone must contain at least one digit")]
    NoDigits,
    /// The input string is too long.
    #[error("phone must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A customer phone number.
///
/// Keeps the caller-supplied formatting (`+91 98765-43210`) for display
/// in address records, and exposes the normalized digit string
/// (`919876543210`) used for customer matching and placeholder-email
/// synthesis. Normalization strips every non-ASCII-digit character and
/// is idempotent: normalizing an already-normalized phone is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Maximum length of a phone string as submitted.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `Phone` from a string, preserving the original formatting.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 32 characters,
    /// or contains no digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(PhoneError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s.contains(|c: char| c.is_ascii_digit()) {
            return Err(PhoneError::NoDigits);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone as originally supplied (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the normalized form: only the ASCII digits, in order.
    #[must_use]
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_phones() {
        assert!(Phone::parse("+91 98765 43210").is_ok());
        assert!(Phone::parse("9876543210").is_ok());
        assert!(Phone::parse("(022) 2345-6789").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Phone::parse(""), Err(PhoneError::Empty)));
        assert!(matches!(Phone::parse("  "), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_no_digits() {
        assert!(matches!(Phone::parse("+- ()"), Err(PhoneError::NoDigits)));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "9".repeat(40);
        assert!(matches!(
            Phone::parse(&long),
            Err(PhoneError::TooLong { .. })
        ));
    }

    #[test]
    fn test_digits_strips_formatting() {
        let phone = Phone::parse("+91 98765-43210").unwrap();
        assert_eq!(phone.digits(), "919876543210");
    }

    #[test]
    fn test_digits_preserves_original() {
        let phone = Phone::parse("+91 98765-43210").unwrap();
        assert_eq!(phone.as_str(), "+91 98765-43210");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let phone = Phone::parse("+91 (987) 654-3210").unwrap();
        let once = phone.digits();
        let normalized = Phone::parse(&once).unwrap();
        assert_eq!(normalized.digits(), once);
    }
}
