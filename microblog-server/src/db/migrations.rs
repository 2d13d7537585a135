//! Schema setup for the microblog tables
//!
//! Every statement is idempotent so `run` is safe on each start.
//! Ownership and uniqueness rules live here as constraints; the
//! repositories translate violations into `DbError` variants.

use sqlx::PgPool;

/// Run all schema migrations
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running microblog migrations...");

    // crypt() / gen_salt() for API key hashes
    sqlx::query("CREATE EXTENSION IF NOT EXISTS pgcrypto")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username VARCHAR(15) NOT NULL UNIQUE,
            email VARCHAR(30) NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_keys (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            hash VARCHAR(100) NOT NULL UNIQUE,
            expires_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // user_id is the followed account, follower_id the one following
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS followers (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            follower_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT unique_follow UNIQUE (user_id, follower_id),
            CONSTRAINT no_self_follow CHECK (user_id <> follower_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tweets (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            data VARCHAR(1000) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS medias (
            id BIGSERIAL PRIMARY KEY,
            link VARCHAR(255) NOT NULL,
            object_key VARCHAR(150) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS medias_tweets (
            tweet_id BIGINT NOT NULL REFERENCES tweets(id) ON DELETE CASCADE,
            media_id BIGINT NOT NULL REFERENCES medias(id) ON DELETE CASCADE,
            PRIMARY KEY (tweet_id, media_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS likes (
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            tweet_id BIGINT NOT NULL REFERENCES tweets(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (user_id, tweet_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    tracing::info!("Microblog migrations complete");
    Ok(())
}

async fn create_indexes(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_api_keys_user ON api_keys(user_id)")
        .execute(pool)
        .await?;

    // Feed lookup: who does the viewer follow
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_followers_follower ON followers(follower_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tweets_user ON tweets(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_likes_tweet ON likes(tweet_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_medias_tweets_media ON medias_tweets(media_id)")
        .execute(pool)
        .await?;

    Ok(())
}
