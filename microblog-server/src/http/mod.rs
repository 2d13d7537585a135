//! HTTP server layer
//!
//! Axum server with:
//! - API key authentication on every `/api` route
//! - CORS (localhost only by default)
//! - Request tracing, timeout and upload size limit
//! - Graceful shutdown
//! - JSON error responses

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use auth::CurrentUser;
pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
