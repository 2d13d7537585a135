//! Media repository
//!
//! A media row records where an uploaded object lives. Media is linked to
//! tweets through `medias_tweets`, so one upload may back several tweets.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::DbError;

/// Media record from database
#[derive(Debug, Clone, FromRow)]
pub struct Media {
    pub id: i64,
    pub link: String,
    pub object_key: String,
    pub created_at: DateTime<Utc>,
}

/// Media no longer referenced by any tweet
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OrphanMedia {
    pub id: i64,
    pub object_key: String,
}

/// Media repository
pub struct MediaRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> MediaRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record an uploaded object, returning the new media id.
    pub async fn create(&self, link: &str, object_key: &str) -> Result<i64, DbError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO medias (link, object_key) VALUES ($1, $2) RETURNING id",
        )
        .bind(link)
        .bind(object_key)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Get a single media record.
    pub async fn get(&self, id: i64) -> Result<Media, DbError> {
        sqlx::query_as::<_, Media>(
            "SELECT id, link, object_key, created_at FROM medias WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("media", id))
    }

    /// Links attached to a tweet, in upload order.
    pub async fn links_for_tweet(&self, tweet_id: i64) -> Result<Vec<String>, DbError> {
        let links: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT m.link
            FROM medias_tweets mt
            JOIN medias m ON m.id = mt.media_id
            WHERE mt.tweet_id = $1
            ORDER BY m.id
            "#,
        )
        .bind(tweet_id)
        .fetch_all(self.pool)
        .await?;

        Ok(links)
    }

    /// Media among `ids` with no remaining tweet reference, inside a transaction.
    pub(crate) async fn orphans_in(
        tx: &mut Transaction<'_, Postgres>,
        ids: &[i64],
    ) -> Result<Vec<OrphanMedia>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let orphans: Vec<OrphanMedia> = sqlx::query_as(
            r#"
            SELECT m.id, m.object_key
            FROM medias m
            WHERE m.id = ANY($1)
              AND NOT EXISTS (SELECT 1 FROM medias_tweets mt WHERE mt.media_id = m.id)
            ORDER BY m.id
            "#,
        )
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;

        Ok(orphans)
    }

    /// Delete media among `ids` with no remaining tweet reference, inside a
    /// transaction. Returns the deleted rows so their objects can be removed.
    pub(crate) async fn purge_orphans_in(
        tx: &mut Transaction<'_, Postgres>,
        ids: &[i64],
    ) -> Result<Vec<OrphanMedia>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut purged: Vec<OrphanMedia> = sqlx::query_as(
            r#"
            DELETE FROM medias m
            WHERE m.id = ANY($1)
              AND NOT EXISTS (SELECT 1 FROM medias_tweets mt WHERE mt.media_id = m.id)
            RETURNING m.id, m.object_key
            "#,
        )
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;

        purged.sort_by_key(|m| m.id);
        Ok(purged)
    }
}
