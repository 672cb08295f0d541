//! Login identifier: an email address or a phone number.

use core::fmt;

use super::email::{Email, EmailError};
use super::phone::{Phone, PhoneError};

/// Errors from [`Identifier::parse`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error(transparent)]
    Phone(#[from] PhoneError),
}

/// What a customer types into the "email or phone" login field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Email(Email),
    Phone(Phone),
}

impl Identifier {
    /// Classify and parse an identifier. Anything containing `@` is treated as
    /// an email, everything else as a phone number.
    ///
    /// # Errors
    ///
    /// Returns the email or phone parse error for the chosen interpretation.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        if s.contains('@') {
            Ok(Self::Email(Email::parse(s)?))
        } else {
            Ok(Self::Phone(Phone::parse(s)?))
        }
    }

    /// The normalized identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(email) => email.as_str(),
            Self::Phone(phone) => phone.as_str(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
