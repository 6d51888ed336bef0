//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a URL scheme, path, or whitespace.
    #[error("shop domain must be a bare hostname")]
    NotAHostname,
    /// The input has no dot-separated labels.
    #[error("shop domain must contain at least one dot")]
    MissingDot,
}

/// A merchant's shop domain (e.g. `my-store.myshopify.com`).
///
/// The domain is the key every per-shop credential and upstream call is
/// scoped by, so it is validated once at the edge and passed around as a
/// type instead of a raw string. Parsing lowercases the input; domains
/// compare case-insensitively on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a hostname (RFC 1035).
    pub const MAX_LENGTH: usize = 253;

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty or longer than 253 characters
    /// - Contains a scheme (`https://`), a path separator, `@`, or whitespace
    /// - Has no dot (a bare label is never a shop domain)
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.contains("://")
            || s.contains('/')
            || s.contains('@')
            || s.contains(char::is_whitespace)
        {
            return Err(ShopDomainError::NotAHostname);
        }

        if !s.contains('.') {
            return Err(ShopDomainError::MissingDot);
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
