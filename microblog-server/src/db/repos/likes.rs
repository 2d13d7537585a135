//! Like repository - one like per (user, tweet)

use sqlx::PgPool;

use super::DbError;

/// Like repository
pub struct LikeRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> LikeRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Like a tweet. A second like by the same user is a UniqueViolation.
    pub async fn like(&self, user_id: i64, tweet_id: i64) -> Result<(), DbError> {
        sqlx::query("INSERT INTO likes (user_id, tweet_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(tweet_id)
            .execute(self.pool)
            .await
            .map_err(|e| DbError::on_insert(e, "like", "tweet", tweet_id))?;

        Ok(())
    }

    /// Remove a like.
    pub async fn unlike(&self, user_id: i64, tweet_id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND tweet_id = $2")
            .bind(user_id)
            .bind(tweet_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("like", tweet_id));
        }

        Ok(())
    }
}
