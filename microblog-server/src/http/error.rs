//! API error types with IntoResponse
//!
//! Every failure leaves the API as
//! `{"result": false, "error_type": <kind>, "error_message": <text>}`.
//! The kind strings and status codes are part of the public contract.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::repos::DbError;
use crate::models::ValidationError;
use crate::storage::StorageError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Missing or unknown API key (401)
    Unauthorized { message: &'static str },

    /// Domain validation failed (400)
    Validation(ValidationError),

    /// Malformed request: bad JSON, path, query or multipart (400)
    BadRequest { message: String },

    /// Referenced entity absent (404)
    NotFound { resource: &'static str, id: String },

    /// Authenticated but not entitled (401, kept for client compatibility)
    Forbidden { reason: String },

    /// Duplicate of a unique relation (400)
    UniqueViolation { resource: &'static str },

    /// Follow edge pointing at the caller (400)
    SelfFollow,

    /// Database error (500, logged)
    Database(DbError),

    /// Object storage error (500, logged)
    Storage(StorageError),

    /// Request exceeded the server timeout (408)
    Timeout,

    /// Failure inside the middleware stack (500, logged)
    Internal { message: String },
}

impl ApiError {
    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "Unauthorized",
            Self::Validation(_) | Self::BadRequest { .. } | Self::SelfFollow => "ValueError",
            Self::NotFound { .. } => "DataNotFound",
            Self::Forbidden { .. } => "ActionForbidden",
            Self::UniqueViolation { .. } => "UniqueViolationError",
            Self::Database(_) => "DatabaseError",
            Self::Storage(_) => "StorageError",
            Self::Timeout => "TimeoutError",
            Self::Internal { .. } => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } | Self::Forbidden { .. } => StatusCode::UNAUTHORIZED,
            Self::Validation(_)
            | Self::BadRequest { .. }
            | Self::SelfFollow
            | Self::UniqueViolation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Database(_) | Self::Storage(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Unauthorized { message } => (*message).to_owned(),
            Self::Validation(e) => e.to_string(),
            Self::BadRequest { message } => message.clone(),
            Self::NotFound { resource, .. } => format!("{} does not exist.", capitalize(resource)),
            Self::Forbidden { reason } => reason.clone(),
            Self::UniqueViolation { resource } => {
                format!("{} already exists.", capitalize(resource))
            }
            Self::SelfFollow => "You can't follow yourself!".to_owned(),
            Self::Timeout => "request timed out".to_owned(),
            Self::Database(_) | Self::Storage(_) | Self::Internal { .. } => {
                "an internal error occurred".to_owned()
            }
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            // Log the actual error, return generic message
            Self::Database(e) => tracing::error!("Database error: {}", e),
            Self::Storage(e) => tracing::error!("Storage error: {}", e),
            Self::Internal { message } => tracing::error!("Middleware error: {}", message),
            Self::Timeout => tracing::warn!("request timed out"),
            Self::NotFound { resource, id } => tracing::debug!(resource, id = %id, "not found"),
            _ => {}
        }

        let body = json!({
            "result": false,
            "error_type": self.kind(),
            "error_message": self.message(),
        });

        (self.status(), Json(body)).into_response()
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
            DbError::UniqueViolation { resource } => Self::UniqueViolation { resource },
            DbError::Forbidden { reason } => Self::Forbidden {
                reason: reason.to_owned(),
            },
            DbError::SelfFollow => Self::SelfFollow,
            DbError::Sqlx(_) => Self::Database(e),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::bad_request(e.body_text())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unauthorized_is_401() {
        let (status, body) = body_json(ApiError::Unauthorized {
            message: "API key is missing",
        })
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["result"], false);
        assert_eq!(body["error_type"], "Unauthorized");
        assert_eq!(body["error_message"], "API key is missing");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = body_json(DbError::not_found("tweet", 5).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "DataNotFound");
        assert_eq!(body["error_message"], "Tweet does not exist.");
    }

    #[tokio::test]
    async fn forbidden_keeps_legacy_401() {
        let err: ApiError = DbError::Forbidden {
            reason: "You can not delete other people's tweets!",
        }
        .into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_type"], "ActionForbidden");
    }

    #[tokio::test]
    async fn duplicate_and_self_follow_are_distinct() {
        let (dup_status, dup) =
            body_json(DbError::UniqueViolation { resource: "follow" }.into()).await;
        let (self_status, own) = body_json(DbError::SelfFollow.into()).await;

        assert_eq!(dup_status, StatusCode::BAD_REQUEST);
        assert_eq!(self_status, StatusCode::BAD_REQUEST);
        assert_eq!(dup["error_type"], "UniqueViolationError");
        assert_eq!(dup["error_message"], "Follow already exists.");
        assert_eq!(own["error_type"], "ValueError");
        assert_ne!(dup["error_type"], own["error_type"]);
    }

    #[tokio::test]
    async fn database_error_is_500_and_hides_details() {
        let err: ApiError = DbError::Sqlx(sqlx::Error::PoolTimedOut).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error_type"], "DatabaseError");
        assert_eq!(body["error_message"], "an internal error occurred");
    }

    #[tokio::test]
    async fn validation_error_is_value_error() {
        let (status, body) =
            body_json(ValidationError::Empty { field: "tweet_data" }.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "ValueError");
        assert_eq!(body["error_message"], "tweet_data cannot be empty");
    }

    #[tokio::test]
    async fn timeout_is_408_json() {
        let (status, body) = body_json(ApiError::Timeout).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["result"], false);
        assert_eq!(body["error_type"], "TimeoutError");
        assert_eq!(body["error_message"], "request timed out");
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("api key"), "Api key");
        assert_eq!(capitalize(""), "");
    }
}
