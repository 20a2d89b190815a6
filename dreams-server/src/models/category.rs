//! Dream category and status enums
//!
//! Both are stored as lowercase TEXT and serialize the same way. Categories
//! also accept their human labels ("Money donation", "Volunteer services",
//! "Gifts") on input, since that is what clients show in filter pickers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// What kind of help a dream asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "Money donation")]
    Money,
    #[serde(alias = "Volunteer services")]
    Services,
    #[serde(alias = "Gifts")]
    Gifts,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Money, Self::Services, Self::Gifts];

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Money => "money",
            Self::Services => "services",
            Self::Gifts => "gifts",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Money => "Money donation",
            Self::Services => "Volunteer services",
            Self::Gifts => "Gifts",
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle) || c.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "category",
                value: s.to_owned(),
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fulfillment state of a dream. Only moves pending -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DreamStatus {
    #[default]
    Pending,
    Completed,
}

impl DreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for DreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
