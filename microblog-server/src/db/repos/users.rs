//! User repository
//!
//! Accounts are created by the admin CLI; the HTTP API only reads them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;
use crate::models::{Email, Username};

/// User record from database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Minimal identity embedded in other responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserRef {
    pub id: i64,
    pub name: String,
}

/// Profile with both directions of the follow graph
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub followers: Vec<UserRef>,
    pub following: Vec<UserRef>,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user. Username and email are both unique.
    pub async fn create(&self, username: Username, email: Email) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(username.as_str())
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::on_insert(e, "user", "user", username.as_str()))
    }

    /// Get a single user by id.
    pub async fn get(&self, id: i64) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))
    }

    /// Load a profile: the user plus followers and followed accounts.
    pub async fn profile(&self, id: i64) -> Result<UserProfile, DbError> {
        let user = self.get(id).await?;

        let followers: Vec<UserRef> = sqlx::query_as(
            r#"
            SELECT u.id, u.username AS name
            FROM followers f
            JOIN users u ON u.id = f.follower_id
            WHERE f.user_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let following: Vec<UserRef> = sqlx::query_as(
            r#"
            SELECT u.id, u.username AS name
            FROM followers f
            JOIN users u ON u.id = f.user_id
            WHERE f.follower_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(UserProfile {
            id: user.id,
            name: user.username,
            followers,
            following,
        })
    }
}
