//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Every body has the shape `{"error": "<message>", "status": <code>}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::db::repos::{DbError, FulfillFailure};
use crate::fulfillment::FulfillError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Business rule refused the request (400)
    Rejected(FulfillError),

    /// Malformed request body or query (400)
    BadRequest { message: String },

    /// Missing or invalid credentials (401)
    Unauthorized { message: String },

    /// Authenticated but not allowed (403)
    Forbidden { reason: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Uniqueness or concurrent-update conflict (409)
    Conflict { message: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500)
    Internal { message: String },
}

impl ApiError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Rejected(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            Self::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message),
            Self::Forbidden { reason } => (StatusCode::FORBIDDEN, reason),
            Self::NotFound { resource, id } => {
                tracing::debug!(resource, %id, "Lookup missed");
                (StatusCode::NOT_FOUND, format!("{} not found", resource))
            }
            Self::Conflict { message } => (StatusCode::CONFLICT, message),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict(message) => Self::Conflict { message },
            _ => Self::Database(e),
        }
    }
}

impl From<FulfillFailure> for ApiError {
    fn from(e: FulfillFailure) -> Self {
        match e {
            FulfillFailure::Rejected(e) => Self::Rejected(e),
            FulfillFailure::Db(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::InvalidCredentials => {
                Self::Unauthorized {
                    message: e.to_string(),
                }
            }
            AuthError::Hashing(_) | AuthError::Encoding(_) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            message: rejection.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejected_fulfillment_carries_message() {
        let response = ApiError::Rejected(FulfillError::AlreadyFulfilled).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "This dream has already been fulfilled.");
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err: ApiError = DbError::NotFound {
            resource: "Comment",
            id: "7".into(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Comment not found");
    }

    #[tokio::test]
    async fn auth_errors_are_401() {
        let response = ApiError::from(AuthError::MissingToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forbidden_is_403() {
        let response = ApiError::forbidden("not yours").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn conflict_is_409() {
        let err: ApiError = DbError::Conflict("taken".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn database_error_is_generic_500() {
        let err: ApiError = DbError::Sqlx(sqlx::Error::RowNotFound).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "an internal error occurred");
    }
}
