//! Route handlers organized by resource

use serde::Serialize;

pub mod health;
pub mod medias;
pub mod root;
pub mod tweets;
pub mod users;

/// Body for endpoints that only report success
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub result: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { result: true }
    }
}
