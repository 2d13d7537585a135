//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use microblog_server::db::migrations;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Create missing tables and indexes. Safe to run repeatedly.
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let pool = args.db.connect().await?;

    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!("migrations complete");
    println!("Schema is up to date");
    Ok(())
}
