//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for list operations (no N+1)
//! - Relies on constraints for uniqueness (no check-then-insert)
//! - Counters are bumped with single `SET x = x + 1` statements
//! - Uses transactions for multi-step operations

pub mod users;
pub mod dreams;
pub mod comments;

pub use users::{User, UserRepo};
pub use dreams::{ContributionRecord, Dream, DreamDetail, DreamRepo, FulfillFailure, Owner};
pub use comments::{Comment, CommentRepo};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// True if `e` is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// True if `e` means SQLite gave up waiting for a lock (SQLITE_BUSY,
/// SQLITE_LOCKED and their extended codes)
pub(crate) fn is_busy(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_busy() {
        assert!(!is_busy(&sqlx::Error::RowNotFound));
        assert!(!is_busy(&sqlx::Error::PoolTimedOut));
    }
}
