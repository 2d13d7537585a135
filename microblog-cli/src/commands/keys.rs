//! API key administration
//!
//! Keys are stored as salted hashes; the plaintext is printed once at issue
//! time and cannot be recovered afterwards.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::distributions::Alphanumeric;
use rand::Rng;

use microblog_server::db::repos::{ApiKeyRepo, UserRepo};

use super::DatabaseArgs;

/// Length of generated keys
const GENERATED_KEY_LEN: usize = 32;

#[derive(Parser, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Issue a key for a user and print it
    Issue(IssueKeyArgs),
    /// Delete every key of a user
    Revoke(RevokeKeyArgs),
}

#[derive(Args, Debug)]
pub struct IssueKeyArgs {
    /// Owner of the key
    #[arg(long)]
    pub user_id: i64,

    /// Use this key instead of generating one
    #[arg(long)]
    pub key: Option<String>,

    /// Days until the key expires (default: never)
    #[arg(long)]
    pub ttl_days: Option<u32>,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

#[derive(Args, Debug)]
pub struct RevokeKeyArgs {
    /// User whose keys are deleted
    #[arg(long)]
    pub user_id: i64,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_keys(args: KeysArgs) -> Result<()> {
    match args.command {
        KeysCommand::Issue(issue) => issue_key(issue).await,
        KeysCommand::Revoke(revoke) => revoke_keys(revoke).await,
    }
}

async fn issue_key(args: IssueKeyArgs) -> Result<()> {
    let key = match args.key {
        Some(key) => normalize_key(&key)?,
        None => generate_key(),
    };
    let ttl = args.ttl_days.map(|days| chrono::Duration::days(days.into()));

    let pool = args.db.connect().await?;
    ApiKeyRepo::new(&pool)
        .issue(args.user_id, &key, ttl)
        .await
        .context("Failed to issue API key")?;

    tracing::info!(user_id = args.user_id, ttl_days = ?args.ttl_days, "api key issued");
    println!("{}", key);
    Ok(())
}

async fn revoke_keys(args: RevokeKeyArgs) -> Result<()> {
    let pool = args.db.connect().await?;

    // Distinguish "no such user" from "user had no keys"
    UserRepo::new(&pool)
        .get(args.user_id)
        .await
        .context("Failed to look up user")?;

    let removed = ApiKeyRepo::new(&pool)
        .revoke_all(args.user_id)
        .await
        .context("Failed to revoke API keys")?;

    tracing::info!(user_id = args.user_id, removed, "api keys revoked");
    println!("Revoked {} key(s)", removed);
    Ok(())
}

/// Random alphanumeric key
fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_KEY_LEN)
        .map(char::from)
        .collect()
}

fn normalize_key(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        bail!("API key must not be empty");
    }
    if key.chars().any(char::is_whitespace) {
        bail!("API key must not contain whitespace");
    }
    Ok(key.to_owned())
}
