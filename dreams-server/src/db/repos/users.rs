//! User repository
//!
//! Password hashing happens in `crate::auth`; this layer only stores the
//! PHC string.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::models::{Email, NewUser, ProfileChanges};
use super::{is_unique_violation, DbError};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, photo, location, \
                            about_me, num_of_dreams, is_staff, date_joined";

/// User record from database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub photo: Option<String>,
    pub location: String,
    pub about_me: String,
    pub num_of_dreams: i64,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user. A taken email is reported as `DbError::Conflict`.
    pub async fn create(&self, user: &NewUser, password_hash: &str) -> Result<User, DbError> {
        let sql = format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, is_staff, date_joined)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(user.email.as_str())
            .bind(password_hash)
            .bind(user.first_name.as_str())
            .bind(user.last_name.as_str())
            .bind(user.is_staff)
            .bind(Utc::now())
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::Conflict("A user with that email already exists.".to_owned())
                } else {
                    DbError::Sqlx(e)
                }
            })
    }

    /// Get a single user by ID.
    pub async fn get(&self, id: i64) -> Result<User, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Look up a user by login email.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Apply a partial profile update and return the new row.
    pub async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> Result<User, DbError> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        let sql = format!(
            r#"
            UPDATE users SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                photo = CASE WHEN ? THEN ? ELSE photo END,
                location = COALESCE(?, location),
                about_me = COALESCE(?, about_me)
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        );

        let photo = changes.photo.as_ref();
        sqlx::query_as::<_, User>(&sql)
            .bind(changes.first_name.as_ref().map(|n| n.as_str()))
            .bind(changes.last_name.as_ref().map(|n| n.as_str()))
            .bind(photo.is_some())
            .bind(photo.and_then(|p| p.as_ref()).map(|p| p.as_str()))
            .bind(changes.location.as_ref().map(|l| l.as_str()))
            .bind(changes.about_me.as_ref().map(|a| a.as_str()))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Make an existing account staff and replace its password.
    pub async fn promote_to_staff(&self, email: &Email, password_hash: &str) -> Result<User, DbError> {
        let sql = format!(
            "UPDATE users SET is_staff = 1, password_hash = ? WHERE email = ? RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(password_hash)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", email.as_str()))
    }
}
