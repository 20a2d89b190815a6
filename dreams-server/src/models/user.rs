//! User input validation - emails, passwords, profile fields

use once_cell::sync::Lazy;
use regex::Regex;

use super::validation::bounded;
use super::{Location, MediaPath, ValidationError};

const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_PERSON_NAME_LEN: usize = 150;
const MAX_ABOUT_LEN: usize = 5_000;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex"));

/// Validated, normalized email address (the login identifier)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Trims whitespace and lower-cases the domain part. The local part is
    /// kept as typed.
    ///
    /// ```
    /// use dreams_server::models::Email;
    ///
    /// let email = Email::new(" Ann@Example.COM ").unwrap();
    /// assert_eq!(email.as_str(), "Ann@example.com");
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }

        if trimmed.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }

        if !EMAIL_RE.is_match(trimmed) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "enter a valid email address",
            });
        }

        // Regex guarantees exactly one '@'
        let (local, domain) = trimmed.split_once('@').unwrap_or((trimmed, ""));
        Ok(Self(format!("{}@{}", local, domain.to_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password, checked for length only. Never stored.
pub struct Password(String);

impl Password {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let len = s.chars().count();
        if len < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }
        if len > MAX_PASSWORD_LEN {
            return Err(ValidationError::TooLong {
                field: "password",
                max: MAX_PASSWORD_LEN,
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// First or last name; blank allowed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonName(String);

impl PersonName {
    pub fn new(s: &str, field: &'static str) -> Result<Self, ValidationError> {
        bounded(s, field, MAX_PERSON_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-text bio; blank allowed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AboutMe(String);

impl AboutMe {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded(s, "about_me", MAX_ABOUT_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Account being created. The password is hashed separately.
#[derive(Debug)]
pub struct NewUser {
    pub email: Email,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub is_staff: bool,
}

/// Partial profile update. `photo: Some(None)` clears the photo.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub photo: Option<Option<MediaPath>>,
    pub location: Option<Location>,
    pub about_me: Option<AboutMe>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.photo.is_none()
            && self.location.is_none()
            && self.about_me.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalizes_domain_only() {
        let email = Email::new("MiXed@Host.ORG").unwrap();
        assert_eq!(email.as_str(), "MiXed@host.org");
    }

    #[test]
    fn email_rejects_bad_shapes() {
        assert!(matches!(Email::new("").unwrap_err(), ValidationError::Empty { .. }));
        assert!(Email::new("a@b").is_err());
        assert!(Email::new("a b@c.d").is_err());
        assert!(Email::new("a@@c.d").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(matches!(
            Password::new("short").unwrap_err(),
            ValidationError::TooShort { min: 8, .. }
        ));
        assert!(Password::new("long enough").is_ok());
        assert!(Password::new(&"p".repeat(129)).is_err());
    }

    #[test]
    fn password_debug_is_redacted() {
        let p = Password::new("hunter2hunter2").unwrap();
        assert_eq!(format!("{:?}", p), "Password(***)");
    }
}
