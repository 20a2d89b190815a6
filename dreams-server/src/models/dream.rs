//! Dream input validation

use super::validation::{bounded, required};
use super::{Category, MediaPath, ValidationError};

/// Maximum length for dream names
const MAX_NAME_LEN: usize = 255;

/// Maximum length for dream descriptions
const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Maximum length for locations (dreams and users)
pub(crate) const MAX_LOCATION_LEN: usize = 150;

/// Validated dream name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DreamName(String);

impl DreamName {
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 255 characters
    ///
    /// ```
    /// use dreams_server::models::DreamName;
    ///
    /// assert!(DreamName::new("A bicycle").is_ok());
    /// assert!(DreamName::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        required(s, "name", MAX_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Target cost of a dream, always > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cost(i64);

impl Cost {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::NotPositive { field: "cost" });
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

/// Validated dream description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(String);

impl Description {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        required(s, "description", MAX_DESCRIPTION_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated location; blank allowed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location(String);

impl Location {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded(s, "location", MAX_LOCATION_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fields a user supplies when creating a dream
#[derive(Debug, Clone)]
pub struct NewDream {
    pub name: DreamName,
    pub description: Description,
    pub image: Option<MediaPath>,
    pub cost: Cost,
    pub category: Category,
    pub location: Location,
}

/// Partial update of the user-writable dream fields.
///
/// `image: Some(None)` clears the image.
#[derive(Debug, Clone, Default)]
pub struct DreamChanges {
    pub name: Option<DreamName>,
    pub description: Option<Description>,
    pub image: Option<Option<MediaPath>>,
    pub cost: Option<Cost>,
    pub category: Option<Category>,
    pub location: Option<Location>,
}

impl DreamChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.cost.is_none()
            && self.category.is_none()
            && self.location.is_none()
    }
}

impl From<NewDream> for DreamChanges {
    /// A full replacement (PUT) is a patch that sets every field.
    fn from(d: NewDream) -> Self {
        Self {
            name: Some(d.name),
            description: Some(d.description),
            image: Some(d.image),
            cost: Some(d.cost),
            category: Some(d.category),
            location: Some(d.location),
        }
    }
}
