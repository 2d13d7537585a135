//! Media upload endpoint

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::db::repos::MediaRepo;
use crate::http::auth::CurrentUser;
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub result: bool,
    pub media_id: i64,
}

/// POST /api/medias - store an upload and return its media id
async fn upload_media(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_owned();
        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::bad_request("multipart field 'file' is required"))?;
    if data.is_empty() {
        return Err(ApiError::bad_request("uploaded file is empty"));
    }

    let stored = state.storage.upload(&filename, data).await?;

    let media_id = match MediaRepo::new(&state.pool)
        .create(&stored.link, &stored.key)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            // Don't leave an object nobody can reference
            if let Err(cleanup) = state.storage.delete(&stored.key).await {
                tracing::warn!(key = %stored.key, error = %cleanup, "failed to remove unrecorded upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(media_id, user_id = user.id(), key = %stored.key, "media uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            result: true,
            media_id,
        }),
    ))
}

/// Media routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/medias", post(upload_media))
}
