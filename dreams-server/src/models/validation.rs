//! Validation error types

use std::fmt;

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Field is shorter than its minimum length
    TooShort { field: &'static str, min: usize },

    /// String doesn't match required format (e.g., email)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Number must be greater than zero
    NotPositive { field: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::TooShort { field, min } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::NotPositive { field } => write!(f, "{} must be a positive integer", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Trim `s` and enforce a character limit. Blank input is allowed.
pub(crate) fn bounded(s: &str, field: &'static str, max: usize) -> Result<String, ValidationError> {
    let trimmed = s.trim();
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Like [`bounded`] but rejects blank input.
pub(crate) fn required(s: &str, field: &'static str, max: usize) -> Result<String, ValidationError> {
    let value = bounded(s, field, max)?;
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "name",
            max: 255,
        };
        assert_eq!(
            err.to_string(),
            "name exceeds maximum length of 255 characters"
        );
        assert_eq!(
            ValidationError::NotPositive { field: "cost" }.to_string(),
            "cost must be a positive integer"
        );
    }

    #[test]
    fn bounded_counts_chars_not_bytes() {
        // 3 chars, 9 bytes
        assert!(bounded("ééé", "location", 3).is_ok());
        assert!(bounded("éééé", "location", 3).is_err());
    }

    #[test]
    fn required_rejects_whitespace() {
        assert_eq!(
            required("   ", "name", 10).unwrap_err(),
            ValidationError::Empty { field: "name" }
        );
        assert_eq!(required("  x ", "name", 10).unwrap(), "x");
    }
}
