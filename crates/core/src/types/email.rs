//! Email address type.
//!
//! The storefront checks two shapes. Checkout forms accept anything of the
//! form `local@domain.tld` without whitespace, the custom order form also
//! rejects a second `@`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input contains whitespace.
    #[error("email cannot contain whitespace")]
    ContainsWhitespace,
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    /// The input contains more than one @ symbol.
    #[error("email must contain a single @ symbol")]
    MultipleAtSymbols,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain has no dot with text on both sides.
    #[error("email domain must look like name.tld")]
    InvalidDomain,
}

/// An email address.
///
/// ## Constraints
///
/// - No whitespace anywhere
/// - At least one character before the first @
/// - After the @, at least one character, a dot, and at least one character
///
/// ## Examples
///
/// ```
/// use origami_core::Email;
///
/// assert!(Email::parse("user@example.com").is_ok());
/// assert!(Email::parse("a@b.c").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("user@example").is_err());
/// assert!(Email::parse("user @example.com").is_err());
/// assert!(Email::parse_strict("a@b@c.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse an `Email` using the checkout rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains whitespace, has no @
    /// with text before it, or has no dotted domain after the first @.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::ContainsWhitespace);
        }

        let at_pos = s.find('@').ok_or(EmailError::MissingAtSymbol)?;

        if at_pos == 0 {
            return Err(EmailError::EmptyLocalPart);
        }

        // A dot needs at least one byte after the @ before it and one after it.
        let domain_start = at_pos + 2;
        let has_dot = s
            .char_indices()
            .any(|(i, c)| c == '.' && i >= domain_start && i + 1 < s.len());

        if !has_dot {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Parse an `Email` that must contain exactly one @.
    ///
    /// # Errors
    ///
    /// Same as [`Email::parse`], plus [`EmailError::MultipleAtSymbols`].
    pub fn parse_strict(s: &str) -> Result<Self, EmailError> {
        let email = Self::parse(s)?;
        if s.matches('@').count() > 1 {
            return Err(EmailError::MultipleAtSymbols);
        }
        Ok(email)
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
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
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
