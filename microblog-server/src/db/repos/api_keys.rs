//! API key repository
//!
//! Keys are stored only as salted `crypt()` hashes (pgcrypto). Resolving a
//! key compares `crypt(candidate, stored_hash)` against each stored hash, so
//! the plaintext never touches a table.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use super::DbError;

/// Advisory lock held while issuing, so duplicate checks see every committed key
const ISSUE_LOCK_ID: i64 = 0x6d62_6b65_7973;

/// API key repository
pub struct ApiKeyRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ApiKeyRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a salted hash of `key` for `user_id`.
    ///
    /// Salted hashes never collide on the UNIQUE column, so duplicate
    /// plaintext keys are detected by hash comparison. Concurrent issuers
    /// are serialized on a transaction-scoped advisory lock.
    pub async fn issue(
        &self,
        user_id: i64,
        key: &str,
        ttl: Option<Duration>,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ISSUE_LOCK_ID)
            .execute(&mut *tx)
            .await?;

        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM api_keys WHERE hash = crypt($1, hash))",
        )
        .bind(key)
        .fetch_one(&mut *tx)
        .await?;

        if exists {
            return Err(DbError::UniqueViolation { resource: "api key" });
        }

        let expires_at: Option<DateTime<Utc>> = ttl.map(|ttl| Utc::now() + ttl);

        sqlx::query(
            r#"
            INSERT INTO api_keys (user_id, hash, expires_at)
            VALUES ($1, crypt($2, gen_salt('md5')), $3)
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::on_insert(e, "api key", "user", user_id))?;

        tx.commit().await?;
        Ok(())
    }

    /// Resolve a presented key to its owner. Expired keys do not match.
    pub async fn resolve(&self, key: &str) -> Result<Option<i64>, DbError> {
        let user_id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM api_keys
            WHERE hash = crypt($1, hash)
              AND (expires_at IS NULL OR expires_at > NOW())
            LIMIT 1
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        Ok(user_id)
    }

    /// Delete every key belonging to a user, returning how many were removed.
    pub async fn revoke_all(&self, user_id: i64) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
