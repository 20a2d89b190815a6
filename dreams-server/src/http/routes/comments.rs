//! Comment endpoints - per-dream comments and likes

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::repos::{Comment, CommentRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, AuthUser, ValidId};
use crate::http::server::AppState;
use crate::models::CommentText;

use super::users::UserSummary;

/// Create comment request. Dream and author come from the path and token.
#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// Comment response
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub user: UserSummary,
    pub dream: i64,
    pub text: String,
    pub created_at: String,
    pub likes: i64,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            user: UserSummary {
                id: c.user_id,
                first_name: c.author_first_name,
                last_name: c.author_last_name,
            },
            dream: c.dream_id,
            text: c.text,
            created_at: c.created_at.to_rfc3339(),
            likes: c.likes,
        }
    }
}

/// Like counter after a like
#[derive(Debug, Serialize)]
pub struct LikesResponse {
    pub likes: i64,
}

/// GET /api/dreams/{id}/comments/ - comments on a dream, oldest first
async fn list_comments(
    State(state): State<Arc<AppState>>,
    ValidId(dream_id): ValidId,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let comments = CommentRepo::new(&state.pool).list_for_dream(dream_id).await?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

/// POST /api/dreams/{id}/comments/ - comment on a dream
async fn create_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidId(dream_id): ValidId,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let text = CommentText::new(&req.text)?;
    let comment = CommentRepo::new(&state.pool)
        .create(dream_id, auth.id(), &text)
        .await?;

    tracing::debug!(comment_id = comment.id, dream_id, user_id = auth.id(), "Comment added");
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

/// POST /api/comments/{id}/like/ - add one like
async fn like_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidId(id): ValidId,
) -> Result<Json<LikesResponse>, ApiError> {
    let likes = CommentRepo::new(&state.pool).like(id).await?;

    tracing::debug!(comment_id = id, user_id = auth.id(), likes, "Comment liked");
    Ok(Json(LikesResponse { likes }))
}

/// Comment routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dreams/{id}/comments/", get(list_comments).post(create_comment))
        .route("/comments/{id}/like/", post(like_comment))
}
