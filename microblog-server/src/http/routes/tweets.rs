//! Tweet endpoints: feed, create, delete, like, unlike

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::OkResponse;
use crate::db::repos::{FeedTweet, LikeRepo, TweetRepo};
use crate::http::auth::CurrentUser;
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::http::server::AppState;
use crate::models::{Pagination, PaginationParams, TweetContent};

/// Create tweet request
#[derive(Debug, Deserialize)]
pub struct CreateTweetRequest {
    pub tweet_data: String,
    #[serde(default)]
    pub tweet_media_ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct CreateTweetResponse {
    pub result: bool,
    pub tweet_id: i64,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub result: bool,
    pub tweets: Vec<FeedTweet>,
    pub total: i64,
}

/// `?purge_media=true` also removes media left without any tweet
#[derive(Debug, Default, Deserialize)]
pub struct DeleteTweetParams {
    #[serde(default)]
    pub purge_media: bool,
}

/// GET /api/tweets - ranked feed for the caller
async fn feed(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<FeedResponse>, ApiError> {
    let Query(params) = params?;
    let page = TweetRepo::new(&state.pool)
        .feed(user.id(), Pagination::from(params))
        .await?;

    Ok(Json(FeedResponse {
        result: true,
        tweets: page.items,
        total: page.total,
    }))
}

/// POST /api/tweets - publish a tweet with optional media
async fn create_tweet(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    payload: Result<Json<CreateTweetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTweetResponse>), ApiError> {
    let Json(req) = payload?;
    let content = TweetContent::new(&req.tweet_data)?;
    let media_ids = req.tweet_media_ids.unwrap_or_default();

    if let Some(bad) = media_ids.iter().find(|id| **id <= 0) {
        return Err(ApiError::bad_request(format!("invalid media id {}", bad)));
    }

    let tweet_id = TweetRepo::new(&state.pool)
        .create(user.id(), content, &media_ids)
        .await?;

    tracing::info!(tweet_id, user_id = user.id(), media = media_ids.len(), "tweet created");
    Ok((
        StatusCode::CREATED,
        Json(CreateTweetResponse {
            result: true,
            tweet_id,
        }),
    ))
}

/// DELETE /api/tweets/{id} - delete one of the caller's tweets
async fn delete_tweet(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidId(tweet_id): ValidId,
    params: Result<Query<DeleteTweetParams>, QueryRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Query(params) = params?;
    let deleted = TweetRepo::new(&state.pool)
        .delete(user.id(), tweet_id, params.purge_media)
        .await?;
    tracing::info!(tweet_id, user_id = user.id(), "tweet deleted");

    if deleted.orphaned_media.is_empty() {
        return Ok(Json(OkResponse::ok()));
    }

    if !deleted.media_purged {
        tracing::debug!(
            tweet_id,
            orphans = deleted.orphaned_media.len(),
            "media left unattached"
        );
        return Ok(Json(OkResponse::ok()));
    }

    let keys: Vec<&str> = deleted
        .orphaned_media
        .iter()
        .map(|m| m.object_key.as_str())
        .collect();

    // Rows are already gone with the tweet; a storage failure only leaks objects
    if let Err(e) = state.storage.delete_many(&keys).await {
        tracing::warn!(tweet_id, error = %e, "failed to remove purged media objects");
    } else {
        tracing::info!(tweet_id, purged = keys.len(), "purged orphaned media");
    }

    Ok(Json(OkResponse::ok()))
}

/// POST /api/tweets/{id}/likes
async fn like_tweet(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidId(tweet_id): ValidId,
) -> Result<(StatusCode, Json<OkResponse>), ApiError> {
    LikeRepo::new(&state.pool).like(user.id(), tweet_id).await?;
    tracing::info!(tweet_id, user_id = user.id(), "tweet liked");
    Ok((StatusCode::CREATED, Json(OkResponse::ok())))
}

/// DELETE /api/tweets/{id}/likes
async fn unlike_tweet(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidId(tweet_id): ValidId,
) -> Result<Json<OkResponse>, ApiError> {
    LikeRepo::new(&state.pool).unlike(user.id(), tweet_id).await?;
    tracing::info!(tweet_id, user_id = user.id(), "like removed");
    Ok(Json(OkResponse::ok()))
}

/// Tweet routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tweets", get(feed).post(create_tweet))
        .route("/api/tweets/{id}", delete(delete_tweet))
        .route("/api/tweets/{id}/likes", post(like_tweet).delete(unlike_tweet))
}
