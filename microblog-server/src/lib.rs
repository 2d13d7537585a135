//! microblog-server: HTTP API for a small social network
//!
//! Users post tweets, like them, follow each other and attach uploaded
//! media. State lives in Postgres; media objects live in an S3 bucket.

pub mod db;
pub mod http;
pub mod models;
pub mod storage;

pub use db::{create_pool, create_pool_with_options};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
pub use storage::{MediaStorage, StorageConfig, StorageError};
