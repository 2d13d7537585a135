//! Command implementations for the microblog binary

use anyhow::{Context, Result};
use clap::Args;
use microblog_server::create_pool_with_options;
use microblog_server::db::pool::DEFAULT_MAX_CONNECTIONS;
use microblog_server::db::PgPool;

pub mod keys;
pub mod migrate;
pub mod serve;
pub mod users;

pub use keys::run_keys;
pub use migrate::run_migrate;
pub use serve::run_serve;
pub use users::run_users;

/// Database connection flags shared by every command
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Maximum pooled connections
    #[arg(long, env = "MICROBLOG_DB_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

impl DatabaseArgs {
    pub async fn connect(&self) -> Result<PgPool> {
        create_pool_with_options(&self.database_url, self.max_connections)
            .await
            .context("Failed to create database pool")
    }
}
