//! HTTP server command
//!
//! Connects the pool, brings the schema up to date, opens the media bucket
//! and serves until Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use microblog_server::db::migrations;
use microblog_server::http::server::DEFAULT_MAX_UPLOAD_BYTES;
use microblog_server::{run_server, MediaStorage, ServerConfig, StorageConfig};

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "MICROBLOG_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Maximum request body size in bytes (bounds media uploads)
    #[arg(long, env = "MICROBLOG_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    #[command(flatten)]
    pub db: DatabaseArgs,

    #[command(flatten)]
    pub s3: S3Args,
}

/// S3-compatible media bucket settings
#[derive(Parser, Debug, Clone)]
pub struct S3Args {
    /// S3 endpoint URL, e.g. http://localhost:9000
    #[arg(long = "s3-url", env = "S3_URL")]
    pub url: String,

    /// Bucket holding uploaded media
    #[arg(long = "s3-bucket", env = "S3_BUCKET")]
    pub bucket: String,

    #[arg(long = "s3-access-key", env = "S3_ACCESS_KEY", hide_env_values = true)]
    pub access_key: String,

    #[arg(long = "s3-secret-key", env = "S3_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    #[arg(long = "s3-region", env = "S3_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Base URL for public media links (default: the endpoint URL)
    #[arg(long = "s3-public-url", env = "S3_PUBLIC_URL")]
    pub public_url: Option<String>,
}

impl From<S3Args> for StorageConfig {
    fn from(args: S3Args) -> Self {
        Self {
            endpoint_url: args.url,
            bucket: args.bucket,
            access_key: args.access_key,
            secret_key: args.secret_key,
            region: args.region,
            public_url: args.public_url,
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let pool = args.db.connect().await?;

    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    let storage_config = StorageConfig::from(args.s3);
    let storage = MediaStorage::s3(&storage_config).context("Failed to configure media storage")?;
    tracing::info!(
        endpoint = %storage_config.endpoint_url,
        bucket = %storage_config.bucket,
        "media storage ready"
    );

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
        timeout: Duration::from_secs(args.timeout),
        max_upload_bytes: args.max_upload_bytes,
    };

    tracing::info!("Starting microblog server on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(pool, storage, config)
        .await
        .context("Server error")?;

    Ok(())
}
