//! microblog - server and admin tooling
//!
//! - `serve`: run the HTTP API
//! - `migrate`: create or update the database schema
//! - `users`: create accounts
//! - `keys`: issue and revoke API keys

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "microblog",
    author,
    version,
    about = "Microblog API server and admin tool",
    long_about = "Run the microblog HTTP API (tweets, likes, follows, media) and manage \
                  its database: schema migrations, user accounts and API keys."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Manage user accounts
    Users(commands::users::UsersArgs),
    /// Issue and revoke API keys
    Keys(commands::keys::KeysArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may supply DATABASE_URL and S3 settings for clap's env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })?;

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Migrate(args) => commands::run_migrate(args).await,
        Commands::Users(args) => commands::run_users(args).await,
        Commands::Keys(args) => commands::run_keys(args).await,
    };

    tracing_setup::shutdown_otel();
    result
}
