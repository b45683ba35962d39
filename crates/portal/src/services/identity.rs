//! Identity gate.
//!
//! Decides the role of whoever submits the sign-up form or the admin login
//! form. The administrator identity comes from [`AdminIdentityConfig`]; every
//! other submission is a customer.

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use shopfloor_core::{ContactError, Email, Phone, Role};

use crate::config::AdminIdentityConfig;

/// Errors that block a sign-in submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Name or phone number left blank on the sign-up form.
    #[error("Name and phone number are required.")]
    MissingCredentials,

    /// A single named field left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The admin login email could not be parsed.
    #[error("{0}")]
    InvalidEmail(ContactError),
}

/// Outcome of the customer sign-up form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The submission matched the administrator identity. No basket is made.
    Admin { display_name: String },
    /// A shopper who must be registered with a fresh basket.
    Customer { name: String, phone: Phone },
}

impl Admission {
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Admin { .. } => Role::Admin,
            Self::Customer { .. } => Role::User,
        }
    }
}

/// Role decisions against the configured administrator identity.
#[derive(Debug, Clone, Copy)]
pub struct IdentityGate<'a> {
    admin: &'a AdminIdentityConfig,
}

impl<'a> IdentityGate<'a> {
    #[must_use]
    pub const fn new(admin: &'a AdminIdentityConfig) -> Self {
        Self { admin }
    }

    /// Classify a sign-up submission.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingCredentials`] if either field is blank.
    #[instrument(skip(self, phone), fields(name = %name.trim()))]
    pub fn admit_customer(&self, name: &str, phone: &str) -> Result<Admission, IdentityError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IdentityError::MissingCredentials);
        }
        let phone = Phone::parse(phone).map_err(|_| IdentityError::MissingCredentials)?;

        if name == self.admin.name && phone.as_str() == self.admin.phone.expose_secret().trim() {
            tracing::info!("Administrator signed in through the sign-up form");
            return Ok(Admission::Admin {
                display_name: self.admin.name.clone(),
            });
        }

        Ok(Admission::Customer {
            name: name.to_string(),
            phone,
        })
    }

    /// Classify an admin login page submission.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingField`] for a blank email and
    /// [`IdentityError::InvalidEmail`] when it is not shaped like an address.
    #[instrument(skip(self, email))]
    pub fn admit_by_email(&self, email: &str) -> Result<Role, IdentityError> {
        let email = Email::parse(email).map_err(|err| match err {
            ContactError::Missing(field) => IdentityError::MissingField(field),
            other @ ContactError::MalformedEmail => IdentityError::InvalidEmail(other),
        })?;

        if email.matches(&self.admin.email) {
            Ok(Role::Admin)
        } else {
            Ok(Role::User)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn admin_identity() -> AdminIdentityConfig {
        AdminIdentityConfig {
            name: "Admin".to_string(),
            phone: SecretString::from("9840121389"),
            email: Email::parse("owner@store.example").unwrap(),
        }
    }

    #[test]
    fn test_configured_admin_is_admitted_as_admin() {
        let admin = admin_identity();
        let gate = IdentityGate::new(&admin);
        let admission = gate.admit_customer("Admin", "9840121389").unwrap();
        assert_eq!(admission.role(), Role::Admin);
    }

    #[test]
    fn test_anyone_else_is_a_customer() {
        let admin = admin_identity();
        let gate = IdentityGate::new(&admin);
        let admission = gate.admit_customer(" Jo ", "555").unwrap();
        assert_eq!(
            admission,
            Admission::Customer {
                name: "Jo".to_string(),
                phone: Phone::parse("555").unwrap(),
            }
        );

        // Right name with the wrong phone is still a customer.
        let admission = gate.admit_customer("Admin", "555").unwrap();
        assert_eq!(admission.role(), Role::User);
    }

    #[test]
    fn test_blank_fields_block_submission() {
        let admin = admin_identity();
        let gate = IdentityGate::new(&admin);
        assert_eq!(
            gate.admit_customer("", "555"),
            Err(IdentityError::MissingCredentials)
        );
        assert_eq!(
            gate.admit_customer("Jo", "  "),
            Err(IdentityError::MissingCredentials)
        );
    }

    #[test]
    fn test_email_login() {
        let admin = admin_identity();
        let gate = IdentityGate::new(&admin);
        assert_eq!(gate.admit_by_email("OWNER@store.example"), Ok(Role::Admin));
        assert_eq!(gate.admit_by_email("shopper@mail.example"), Ok(Role::User));
        assert_eq!(
            gate.admit_by_email(""),
            Err(IdentityError::MissingField("email"))
        );
        assert!(matches!(
            gate.admit_by_email("not-an-email"),
            Err(IdentityError::InvalidEmail(_))
        ));
    }
}
