//! API key authentication
//!
//! Every `/api` route runs behind [`require_api_key`]. The middleware resolves
//! the presented key to a user before any handler code runs and stores the
//! result as a [`CurrentUser`] request extension. Handlers take the acting
//! user from that extension only, never from the path or body.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::error::ApiError;
use super::server::AppState;
use crate::db::repos::ApiKeyRepo;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "api-key";

/// Identity resolved from the API key for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl CurrentUser {
    pub fn id(self) -> i64 {
        self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when the route sits behind require_api_key
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(ApiError::Unauthorized {
                message: "API key is missing",
            })
    }
}

/// Middleware: resolve the API key or reject with 401.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = presented_key(req.headers())
        .map(str::to_owned)
        .ok_or(ApiError::Unauthorized {
            message: "API key is missing",
        })?;

    let user_id = ApiKeyRepo::new(&state.pool)
        .resolve(&key)
        .await?
        .ok_or(ApiError::Unauthorized {
            message: "User with provided api-key not found",
        })?;

    tracing::debug!(user_id, path = %req.uri().path(), "authenticated request");
    req.extensions_mut().insert(CurrentUser(user_id));

    Ok(next.run(req).await)
}

/// Key from the `api-key` header, falling back to `Authorization: Bearer`.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let from_api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty());

    from_api_key.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|k| !k.is_empty())
    })
}
