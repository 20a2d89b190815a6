//! Fulfill endpoint - apply a contribution to a dream

use std::sync::Arc;

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use serde_json::Value;

use crate::db::repos::DreamRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, AuthUser, ValidId};
use crate::http::server::AppState;

use super::dreams::DreamResponse;
use super::users::UserDetail;

/// POST /api/dreams/{id}/fulfill/ - contribute to a dream
///
/// The body is read per category: `contribution_amount` for money dreams,
/// `contribution_description` for services and gifts. Responds with the
/// updated dream.
async fn fulfill_dream(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidId(id): ValidId,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<DreamResponse<UserDetail>>, ApiError> {
    let detail = DreamRepo::new(&state.pool)
        .fulfill(id, auth.id(), &payload)
        .await
        .inspect_err(|e| tracing::debug!(dream_id = id, user_id = auth.id(), "Fulfill refused: {}", e))?;

    Ok(Json(DreamResponse::detail(detail, &state.media_url)))
}

/// Fulfill routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/dreams/{id}/fulfill/", post(fulfill_dream))
}
