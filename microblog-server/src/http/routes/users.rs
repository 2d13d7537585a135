//! User endpoints: profiles and the follow graph

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::OkResponse;
use crate::db::repos::{FollowRepo, UserProfile, UserRepo};
use crate::http::auth::CurrentUser;
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub result: bool,
    pub user: UserProfile,
}

/// GET /api/users/me
async fn me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    profile_of(&state, user.id()).await
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    ValidId(user_id): ValidId,
) -> Result<Json<ProfileResponse>, ApiError> {
    profile_of(&state, user_id).await
}

async fn profile_of(state: &AppState, user_id: i64) -> Result<Json<ProfileResponse>, ApiError> {
    let user = UserRepo::new(&state.pool).profile(user_id).await?;
    Ok(Json(ProfileResponse { result: true, user }))
}

/// POST /api/users/{id}/follow
async fn follow(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidId(followee_id): ValidId,
) -> Result<(StatusCode, Json<OkResponse>), ApiError> {
    FollowRepo::new(&state.pool)
        .follow(user.id(), followee_id)
        .await?;
    tracing::info!(follower_id = user.id(), followee_id, "follow created");
    Ok((StatusCode::CREATED, Json(OkResponse::ok())))
}

/// DELETE /api/users/{id}/follow
async fn unfollow(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidId(followee_id): ValidId,
) -> Result<Json<OkResponse>, ApiError> {
    FollowRepo::new(&state.pool)
        .unfollow(user.id(), followee_id)
        .await?;
    tracing::info!(follower_id = user.id(), followee_id, "follow removed");
    Ok(Json(OkResponse::ok()))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/me", get(me))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/follow", post(follow).delete(unfollow))
}
