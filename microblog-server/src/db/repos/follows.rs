//! Follow edges (follower -> followee)

use sqlx::PgPool;

use super::DbError;

/// Follow repository
pub struct FollowRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> FollowRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a follow edge.
    ///
    /// Self-follow is rejected before touching the database; duplicates and
    /// unknown followees are reported by the constraints.
    pub async fn follow(&self, follower_id: i64, followee_id: i64) -> Result<(), DbError> {
        if follower_id == followee_id {
            return Err(DbError::SelfFollow);
        }

        sqlx::query("INSERT INTO followers (user_id, follower_id) VALUES ($1, $2)")
            .bind(followee_id)
            .bind(follower_id)
            .execute(self.pool)
            .await
            .map_err(|e| DbError::on_insert(e, "follow", "user", followee_id))?;

        Ok(())
    }

    /// Remove a follow edge. Removing an absent edge is NotFound.
    pub async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM followers WHERE user_id = $1 AND follower_id = $2")
            .bind(followee_id)
            .bind(follower_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("follow", followee_id));
        }

        Ok(())
    }
}
