//! User endpoints - registration, token login, own profile

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::{self, AccessToken, AuthError};
use crate::db::repos::{Owner, User, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{double_option, ApiJson, AuthUser};
use crate::http::server::AppState;
use crate::models::{
    media_url, AboutMe, Email, Location, MediaPath, NewUser, Password, PersonName, ProfileChanges,
};

/// Registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Token (login) request
#[derive(Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// Profile update request; absent fields are left alone
#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub photo: Option<Option<String>>,
    pub location: Option<String>,
    pub about_me: Option<String>,
}

impl UpdateProfileRequest {
    fn validate(self) -> Result<ProfileChanges, ApiError> {
        Ok(ProfileChanges {
            first_name: self
                .first_name
                .map(|s| PersonName::new(&s, "first_name"))
                .transpose()?,
            last_name: self
                .last_name
                .map(|s| PersonName::new(&s, "last_name"))
                .transpose()?,
            photo: self
                .photo
                .map(|p| p.map(|s| MediaPath::new(&s, "photo")).transpose())
                .transpose()?,
            location: self.location.map(|s| Location::new(&s)).transpose()?,
            about_me: self.about_me.map(|s| AboutMe::new(&s)).transpose()?,
        })
    }
}

/// Full profile, shown to the user themselves
#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub photo: Option<String>,
    pub photo_url: Option<String>,
    pub location: String,
    pub about_me: String,
    pub num_of_dreams: i64,
    pub date_joined: String,
}

impl ProfileResponse {
    fn build(u: User, media: &str) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            photo_url: u.photo.as_deref().map(|p| media_url(media, p)),
            photo: u.photo,
            location: u.location,
            about_me: u.about_me,
            num_of_dreams: u.num_of_dreams,
            date_joined: u.date_joined.to_rfc3339(),
        }
    }
}

/// Public user shape used inside dream listings and comments
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl From<Owner> for UserSummary {
    fn from(o: Owner) -> Self {
        Self {
            id: o.id,
            first_name: o.first_name,
            last_name: o.last_name,
        }
    }
}

/// Public user shape on a single dream, adds the photo
#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub photo_url: Option<String>,
}

impl UserDetail {
    pub fn build(o: Owner, media: &str) -> Self {
        Self {
            id: o.id,
            photo_url: o.photo.as_deref().map(|p| media_url(media, p)),
            first_name: o.first_name,
            last_name: o.last_name,
        }
    }
}

async fn hash_blocking(password: Password) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal {
            message: format!("hashing task failed: {}", e),
        })?
        .map_err(ApiError::from)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal {
            message: format!("verification task failed: {}", e),
        })
}

/// POST /api/users/register/ - create an account
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let password = Password::new(&req.password)?;
    let new_user = NewUser {
        email: Email::new(&req.email)?,
        first_name: PersonName::new(&req.first_name, "first_name")?,
        last_name: PersonName::new(&req.last_name, "last_name")?,
        is_staff: false,
    };

    let repo = UserRepo::new(&state.pool);
    if repo.find_by_email(&new_user.email).await?.is_some() {
        return Err(ApiError::Conflict {
            message: "A user with that email already exists.".to_string(),
        });
    }

    let hash = hash_blocking(password).await?;
    let user = repo.create(&new_user, &hash).await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse::build(user, &state.media_url)),
    ))
}

/// POST /api/users/token/ - exchange credentials for an access token
async fn token(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    let email = Email::new(&req.email).map_err(|_| AuthError::InvalidCredentials)?;

    let user = UserRepo::new(&state.pool)
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_blocking(req.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = user.id, "Rejected login");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(Json(state.tokens.issue(user.id)?))
}

/// GET /api/users/me/ - own profile
async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Json<ProfileResponse> {
    Json(ProfileResponse::build(user, &state.media_url))
}

/// PATCH /api/users/me/ - update own profile
async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let changes = req.validate()?;
    let user = UserRepo::new(&state.pool)
        .update_profile(auth.id(), &changes)
        .await?;
    Ok(Json(ProfileResponse::build(user, &state.media_url)))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/register/", post(register))
        .route("/users/token/", post(token))
        .route("/users/me/", get(me).patch(update_me))
}
