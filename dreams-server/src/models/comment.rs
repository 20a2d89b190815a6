//! Comment text validation

use super::validation::required;
use super::ValidationError;

/// Maximum length for comment text
const MAX_TEXT_LEN: usize = 2_000;

/// Validated comment text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentText(String);

impl CommentText {
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 2000 characters
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        required(s, "text", MAX_TEXT_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_text() {
        assert_eq!(CommentText::new("  Good luck! ").unwrap().as_str(), "Good luck!");
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            CommentText::new("").unwrap_err(),
            ValidationError::Empty { field: "text" }
        ));
    }

    #[test]
    fn max_length() {
        assert!(CommentText::new(&"a".repeat(2000)).is_ok());
        assert!(CommentText::new(&"a".repeat(2001)).is_err());
    }
}
