//! Database layer - connection pool, schema and repositories
//!
//! # Design Principles
//!
//! - Connection pool, never a shared connection behind a mutex
//! - List operations use JOINs or batched `= ANY($1)` lookups, no N+1 queries
//! - Rely on DB constraints and classify the violation, no check-then-insert
//! - Transactions for multi-step operations

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options};
pub use sqlx::PgPool;
pub use repos::*;
