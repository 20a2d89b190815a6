//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::{Deserialize, Deserializer};

use crate::auth::AuthError;
use crate::db::repos::{DbError, User, UserRepo};
use crate::models::ValidationError;
use super::error::ApiError;
use super::server::AppState;

/// JSON body whose rejections render as 400 `ApiError`s
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Integer id from the path, rejected with a JSON 400 when malformed
#[derive(Debug, Clone, Copy)]
pub struct ValidId(pub i64);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        id.parse::<i64>().map(Self).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "must be an integer",
            })
        })
    }
}

/// Authenticated user, loaded from the bearer token's subject
///
/// Handlers that take this extractor require authentication; handlers
/// that don't are open to anonymous readers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    /// Owners and staff may modify a resource; everyone else gets 403.
    pub fn ensure_can_modify(&self, owner_id: i64) -> Result<(), ApiError> {
        if self.0.id == owner_id || self.0.is_staff {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "You do not have permission to perform this action.",
            ))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?;

        let claims = state.tokens.verify(token.trim())?;
        let user_id = claims.user_id()?;

        // A token outliving its user is just an invalid token
        match UserRepo::new(&state.pool).get(user_id).await {
            Ok(user) => Ok(Self(user)),
            Err(DbError::NotFound { .. }) => {
                Err(AuthError::InvalidToken("user no longer exists".to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Deserialize a field that distinguishes "absent" from "null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
