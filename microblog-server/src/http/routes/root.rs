//! Authenticated greeting, handy for checking a key

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::http::auth::CurrentUser;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct HelloResponse {
    pub result: bool,
    pub message: &'static str,
    pub user_id: i64,
}

/// GET /api
async fn hello(user: CurrentUser) -> Json<HelloResponse> {
    Json(HelloResponse {
        result: true,
        message: "Hello world",
        user_id: user.id(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api", get(hello))
}
