//! Dream endpoints - list, create, retrieve, update, delete

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::repos::{ContributionRecord, Dream, DreamDetail, DreamRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{double_option, ApiJson, AuthUser, ValidId};
use crate::http::server::AppState;
use crate::models::{
    media_url, Category, Cost, Description, DreamChanges, DreamName, DreamStatus, Location,
    MediaPath, NewDream,
};

use super::users::{UserDetail, UserSummary};

/// Query params for the dream list
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

/// Create (and full replace) request
#[derive(Deserialize)]
pub struct CreateDreamRequest {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub cost: i64,
    pub category: String,
    #[serde(default)]
    pub location: String,
}

impl CreateDreamRequest {
    fn validate(self) -> Result<NewDream, ApiError> {
        Ok(NewDream {
            name: DreamName::new(&self.name)?,
            description: Description::new(&self.description)?,
            image: self
                .image
                .map(|s| MediaPath::new(&s, "image"))
                .transpose()?,
            cost: Cost::new(self.cost)?,
            category: self.category.parse()?,
            location: Location::new(&self.location)?,
        })
    }
}

/// Partial update request; absent fields are left alone
#[derive(Deserialize)]
pub struct UpdateDreamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    pub cost: Option<i64>,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl UpdateDreamRequest {
    fn validate(self) -> Result<DreamChanges, ApiError> {
        Ok(DreamChanges {
            name: self.name.map(|s| DreamName::new(&s)).transpose()?,
            description: self.description.map(|s| Description::new(&s)).transpose()?,
            image: self
                .image
                .map(|i| i.map(|s| MediaPath::new(&s, "image")).transpose())
                .transpose()?,
            cost: self.cost.map(Cost::new).transpose()?,
            category: self
                .category
                .map(|s| s.parse::<Category>())
                .transpose()?,
            location: self.location.map(|s| Location::new(&s)).transpose()?,
        })
    }
}

/// In-kind contribution as shown on a dream
#[derive(Serialize)]
pub struct ContributionResponse {
    pub id: i64,
    pub dream: i64,
    pub user: i64,
    pub description: String,
    pub date: String,
}

impl From<ContributionRecord> for ContributionResponse {
    fn from(c: ContributionRecord) -> Self {
        Self {
            id: c.id,
            dream: c.dream_id,
            user: c.user_id,
            description: c.description,
            date: c.date.to_rfc3339(),
        }
    }
}

/// Dream as listed (`U = UserSummary`) or retrieved (`U = UserDetail`)
#[derive(Serialize)]
pub struct DreamResponse<U> {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub user: U,
    pub cost: i64,
    pub accumulated: i64,
    pub status: DreamStatus,
    pub category: Category,
    pub date_added: String,
    pub location: String,
    pub views: i64,
    pub contributions: Vec<ContributionResponse>,
}

impl<U> DreamResponse<U> {
    fn build(d: Dream, contributions: Vec<ContributionRecord>, user: U, media: &str) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            image_url: d.image.as_deref().map(|i| media_url(media, i)),
            image: d.image,
            user,
            cost: d.cost,
            accumulated: d.accumulated,
            status: d.status,
            category: d.category,
            date_added: d.date_added.to_rfc3339(),
            location: d.location,
            views: d.views,
            contributions: contributions
                .into_iter()
                .map(ContributionResponse::from)
                .collect(),
        }
    }
}

impl DreamResponse<UserSummary> {
    pub fn summary(detail: DreamDetail, media: &str) -> Self {
        let DreamDetail { dream, owner, contributions } = detail;
        Self::build(dream, contributions, UserSummary::from(owner), media)
    }
}

impl DreamResponse<UserDetail> {
    pub fn detail(detail: DreamDetail, media: &str) -> Self {
        let DreamDetail { dream, owner, contributions } = detail;
        Self::build(dream, contributions, UserDetail::build(owner, media), media)
    }
}

/// Create shape echoed back after POST
#[derive(Serialize)]
pub struct DreamCreatedResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub cost: i64,
    pub category: Category,
    pub location: String,
}

impl From<Dream> for DreamCreatedResponse {
    fn from(d: Dream) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            image: d.image,
            cost: d.cost,
            category: d.category,
            location: d.location,
        }
    }
}

/// GET /api/dreams/ - list dreams, optionally filtered by category
async fn list_dreams(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<DreamResponse<UserSummary>>>, ApiError> {
    let category = params
        .category
        .filter(|c| !c.trim().is_empty())
        .map(|c| c.parse::<Category>())
        .transpose()?;

    let dreams = DreamRepo::new(&state.pool).list(category).await?;
    Ok(Json(
        dreams
            .into_iter()
            .map(|d| DreamResponse::summary(d, &state.media_url))
            .collect(),
    ))
}

/// POST /api/dreams/ - create a dream owned by the caller
async fn create_dream(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateDreamRequest>,
) -> Result<(StatusCode, Json<DreamCreatedResponse>), ApiError> {
    let new = req.validate()?;
    let dream = DreamRepo::new(&state.pool).create(auth.id(), &new).await?;

    tracing::info!(
        dream_id = dream.id,
        user_id = auth.id(),
        category = %dream.category,
        "Dream created"
    );
    Ok((StatusCode::CREATED, Json(DreamCreatedResponse::from(dream))))
}

/// GET /api/dreams/{id}/ - retrieve a dream, counting the view
async fn get_dream(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<DreamResponse<UserDetail>>, ApiError> {
    let repo = DreamRepo::new(&state.pool);
    repo.record_view(id).await?;
    let detail = repo.get(id).await?;
    Ok(Json(DreamResponse::detail(detail, &state.media_url)))
}

/// Load a dream and check the caller may change it.
async fn writable(repo: &DreamRepo<'_>, auth: &AuthUser, id: i64) -> Result<Dream, ApiError> {
    let dream = repo.find(id).await?;
    auth.ensure_can_modify(dream.user_id)?;
    Ok(dream)
}

async fn apply_changes(
    state: &AppState,
    auth: &AuthUser,
    id: i64,
    changes: DreamChanges,
) -> Result<Json<DreamResponse<UserDetail>>, ApiError> {
    let repo = DreamRepo::new(&state.pool);
    writable(&repo, auth, id).await?;
    repo.update(id, &changes).await?;

    tracing::debug!(dream_id = id, user_id = auth.id(), "Dream updated");
    let detail = repo.get(id).await?;
    Ok(Json(DreamResponse::detail(detail, &state.media_url)))
}

/// PUT /api/dreams/{id}/ - replace every writable field
async fn replace_dream(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidId(id): ValidId,
    ApiJson(req): ApiJson<CreateDreamRequest>,
) -> Result<Json<DreamResponse<UserDetail>>, ApiError> {
    let changes = DreamChanges::from(req.validate()?);
    apply_changes(&state, &auth, id, changes).await
}

/// PATCH /api/dreams/{id}/ - change only the given fields
async fn patch_dream(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidId(id): ValidId,
    ApiJson(req): ApiJson<UpdateDreamRequest>,
) -> Result<Json<DreamResponse<UserDetail>>, ApiError> {
    let changes = req.validate()?;
    apply_changes(&state, &auth, id, changes).await
}

/// DELETE /api/dreams/{id}/ - delete a dream with its comments and contributions
async fn delete_dream(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidId(id): ValidId,
) -> Result<StatusCode, ApiError> {
    let repo = DreamRepo::new(&state.pool);
    writable(&repo, &auth, id).await?;
    repo.delete(id).await?;

    tracing::info!(dream_id = id, user_id = auth.id(), "Dream deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Dream routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dreams/", get(list_dreams).post(create_dream))
        .route(
            "/dreams/{id}/",
            get(get_dream)
                .put(replace_dream)
                .patch(patch_dream)
                .delete(delete_dream),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_parses_category_labels() {
        let req: CreateDreamRequest = serde_json::from_value(serde_json::json!({
            "name": "Guitar",
            "description": "An acoustic guitar",
            "cost": 300,
            "category": "Money donation"
        }))
        .unwrap();

        let new = req.validate().unwrap();
        assert_eq!(new.category, Category::Money);
        assert_eq!(new.location.as_str(), "");
        assert!(new.image.is_none());
    }

    #[test]
    fn update_request_rejects_non_positive_cost() {
        let req: UpdateDreamRequest =
            serde_json::from_value(serde_json::json!({ "cost": 0 })).unwrap();
        assert!(matches!(req.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn update_request_clears_image_on_null() {
        let req: UpdateDreamRequest =
            serde_json::from_value(serde_json::json!({ "image": null })).unwrap();
        let changes = req.validate().unwrap();
        assert!(matches!(changes.image, Some(None)));
        assert!(changes.name.is_none());
    }
}
