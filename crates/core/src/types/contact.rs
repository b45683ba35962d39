//! Contact details captured at sign-up and admin login.
//!
//! Sign-up only checks that fields are present; neither type attempts to
//! verify that a number or mailbox actually exists.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing contact details.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The field was blank.
    #[error("{0} is required")]
    Missing(&'static str),
    /// The email address has no `@`, or nothing on one side of it.
    #[error("email must look like name@domain")]
    MalformedEmail,
}

/// A customer phone number, stored as entered (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a phone number, rejecting blank input.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Missing`] when the trimmed input is empty.
    pub fn parse(raw: &str) -> Result<Self, ContactError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ContactError::Missing("phone number"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address with a non-empty local part and domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse an email address.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Missing`] for blank input and
    /// [`ContactError::MalformedEmail`] when the `name@domain` shape is broken.
    pub fn parse(raw: &str) -> Result<Self, ContactError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ContactError::Missing("email"));
        }
        match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(trimmed.to_owned()))
            }
            _ => Err(ContactError::MalformedEmail),
        }
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, as mail providers treat addresses.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_requires_presence() {
        assert_eq!(Phone::parse("   "), Err(ContactError::Missing("phone number")));
        assert_eq!(Phone::parse(" 555 ").unwrap().as_str(), "555");
    }

    #[test]
    fn test_email_shape() {
        assert!(Email::parse("cashier@store.example").is_ok());
        assert_eq!(Email::parse(""), Err(ContactError::Missing("email")));
        assert_eq!(Email::parse("no-at"), Err(ContactError::MalformedEmail));
        assert_eq!(Email::parse("@store"), Err(ContactError::MalformedEmail));
        assert_eq!(Email::parse("name@"), Err(ContactError::MalformedEmail));
    }

    #[test]
    fn test_email_matches_ignores_case() {
        let a = Email::parse("Owner@Store.example").unwrap();
        let b: Email = "owner@store.example".parse().unwrap();
        assert!(a.matches(&b));
    }
}
