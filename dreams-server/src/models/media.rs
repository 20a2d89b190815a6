//! Media references (dream images, user photos)
//!
//! Files themselves live outside this service. Records hold a path relative
//! to the media root, or an absolute http(s) URL.

use serde::{Deserialize, Serialize};

use super::ValidationError;

const MAX_MEDIA_PATH_LEN: usize = 255;

/// Validated media path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaPath(String);

impl MediaPath {
    /// # Rules
    /// - Non-empty, max 255 characters
    /// - Relative paths may not escape the media root (`..`) or start with `/`
    pub fn new(s: &str, field: &'static str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field });
        }

        if trimmed.len() > MAX_MEDIA_PATH_LEN {
            return Err(ValidationError::TooLong {
                field,
                max: MAX_MEDIA_PATH_LEN,
            });
        }

        if !is_absolute_url(trimmed)
            && (trimmed.starts_with('/') || trimmed.split('/').any(|seg| seg == ".."))
        {
            return Err(ValidationError::InvalidFormat {
                field,
                reason: "must be a relative media path or an http(s) URL",
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn is_absolute_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Render a stored media path as a public URL.
///
/// ```
/// use dreams_server::models::media_url;
///
/// assert_eq!(media_url("/media/", "dreams/a.png"), "/media/dreams/a.png");
/// assert_eq!(media_url("/media", "dreams/a.png"), "/media/dreams/a.png");
/// assert_eq!(media_url("/media/", "https://cdn.example/a.png"), "https://cdn.example/a.png");
/// ```
pub fn media_url(prefix: &str, path: &str) -> String {
    if is_absolute_url(path) {
        return path.to_owned();
    }
    format!("{}/{}", prefix.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_relative_and_urls() {
        assert!(MediaPath::new("uploads/dreams/bike.jpg", "image").is_ok());
        assert!(MediaPath::new("https://img.example/bike.jpg", "image").is_ok());
    }

    #[test]
    fn rejects_traversal_and_rooted() {
        assert!(MediaPath::new("../etc/passwd", "image").is_err());
        assert!(MediaPath::new("uploads/../../x", "image").is_err());
        assert!(MediaPath::new("/etc/passwd", "image").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            MediaPath::new("  ", "photo").unwrap_err(),
            ValidationError::Empty { field: "photo" }
        );
    }
}
