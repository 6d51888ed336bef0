//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Local-part prefix used for synthesized COD placeholder addresses.
const COD_PLACEHOLDER_PREFIX: &str = "cod-";

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain part (after @) is empty.
    #[error("email domain cannot be empty")]
    EmptyDomain,
}

/// An email address.
///
/// Validation is structural only: a local part and a domain separated by
/// one `@`, within the RFC 5321 length limit. Upstream order creation
/// commonly requires an email, so a COD order with no caller-supplied
/// address gets a deterministic placeholder synthesized from the phone
/// digits via [`Email::cod_placeholder`]. Placeholder addresses are
/// detectable with [`Email::is_cod_placeholder`] and must never be
/// treated as a real contact channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 254 characters,
    /// missing an `@`, or has an empty local part or domain.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let at_pos = s.find('@').ok_or(EmailError::MissingAtSymbol)?;

        if at_pos == 0 {
            return Err(EmailError::EmptyLocalPart);
        }

        if at_pos == s.len() - 1 {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Synthesize the deterministic COD placeholder address for a phone.
    ///
    /// The same digit string always yields the same address:
    /// `cod-<digits>@<domain>`.
    #[must_use]
    pub fn cod_placeholder(phone_digits: &str, domain: &str) -> Self {
        Self(format!("{COD_PLACEHOLDER_PREFIX}{phone_digits}@{domain}"))
    }

    /// Returns true if this address was synthesized by
    /// [`Email::cod_placeholder`] rather than supplied by a customer.
    #[must_use]
    pub fn is_cod_placeholder(&self) -> bool {
        self.local_part().starts_with(COD_PLACEHOLDER_PREFIX)
            && self
                .local_part()
                .chars()
                .skip(COD_PLACEHOLDER_PREFIX.len())
                .all(|c| c.is_ascii_digit())
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the local part of the email (before the @).
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split('@').nth(1).unwrap_or("")
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user.name+tag@domain.co.uk").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let email = Email::parse("  user@example.com ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Email::parse(""), Err(EmailError::Empty)));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_missing_at() {
        assert!(matches!(
            Email::parse("no-at-symbol"),
            Err(EmailError::MissingAtSymbol)
        ));
    }

    #[test]
    fn test_parse_empty_local_part() {
        assert!(matches!(
            Email::parse("@domain.com"),
            Err(EmailError::EmptyLocalPart)
        ));
    }

    #[test]
    fn test_parse_empty_domain() {
        assert!(matches!(Email::parse("user@"), Err(EmailError::EmptyDomain)));
    }

    #[test]
    fn test_cod_placeholder_is_deterministic() {
        let a = Email::cod_placeholder("919876543210", "codorder.local");
        let b = Email::cod_placeholder("919876543210", "codorder.local");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "cod-919876543210@codorder.local");
    }

    #[test]
    fn test_cod_placeholder_is_detectable() {
        let placeholder = Email::cod_placeholder("9876543210", "codorder.local");
        assert!(placeholder.is_cod_placeholder());

        let real = Email::parse("customer@example.com").unwrap();
        assert!(!real.is_cod_placeholder());

        // Similar local part, but not all digits after the prefix.
        let lookalike = Email::parse("cod-fish@example.com").unwrap();
        assert!(!lookalike.is_cod_placeholder());
    }

    #[test]
    fn test_cod_placeholder_parses_as_valid_email() {
        let placeholder = Email::cod_placeholder("9876543210", "codorder.local");
        assert!(Email::parse(placeholder.as_str()).is_ok());
    }

    #[test]
    fn test_local_part_and_domain() {
        let email = Email::parse("user@example.com").unwrap();
        assert_eq!(email.local_part(), "user");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_serde_roundtrip() {
        let email = Email::parse("user@example.com").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"user@example.com\"");

        let parsed: Email = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, email);
    }
}
