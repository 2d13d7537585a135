//! User account administration

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use microblog_server::db::repos::UserRepo;
use microblog_server::models::{Email, Username};

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Create a user and print its id
    Add(AddUserArgs),
}

#[derive(Args, Debug)]
pub struct AddUserArgs {
    /// Username (max 15 characters, no whitespace)
    #[arg(long)]
    pub name: String,

    /// Email address (max 30 characters)
    #[arg(long)]
    pub email: String,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_users(args: UsersArgs) -> Result<()> {
    match args.command {
        UsersCommand::Add(add) => add_user(add).await,
    }
}

async fn add_user(args: AddUserArgs) -> Result<()> {
    // Validate before touching the database
    let username = Username::new(&args.name).context("Invalid username")?;
    let email = Email::new(&args.email).context("Invalid email")?;

    let pool = args.db.connect().await?;
    let user = UserRepo::new(&pool)
        .create(username, email)
        .await
        .context("Failed to create user")?;

    tracing::info!(user_id = user.id, username = %user.username, "user created");
    println!("{}", user.id);
    Ok(())
}
