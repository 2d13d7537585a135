//! Tweet repository
//!
//! Handles tweets with:
//! - Atomic creation with media attachments (transaction)
//! - Owner-only deletion cascading to likes and attachments
//! - The ranked feed: followed authors plus the viewer, most liked first

use std::collections::HashMap;

use serde::Serialize;
use sqlx::{FromRow, PgPool, Row};

use super::{DbError, MediaRepo, OrphanMedia, UserRef};
use crate::models::{Page, Pagination, TweetContent};

/// Liker identity inside a feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct LikeRef {
    pub user_id: i64,
    pub name: String,
}

/// One feed entry with everything the client renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedTweet {
    pub id: i64,
    pub content: String,
    pub attachments: Vec<String>,
    pub author: UserRef,
    pub likes: Vec<LikeRef>,
}

/// Result of a successful delete
#[derive(Debug, Clone, Default)]
pub struct DeletedTweet {
    pub tweet_id: i64,
    /// Media that was attached to the tweet and is now attached to nothing
    pub orphaned_media: Vec<OrphanMedia>,
    /// Whether `orphaned_media` rows were deleted along with the tweet
    pub media_purged: bool,
}

/// Ranked page row before likes/attachments are joined in
#[derive(Debug, Clone)]
struct FeedRow {
    id: i64,
    content: String,
    author: UserRef,
}

/// Tweet repository
pub struct TweetRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TweetRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a tweet and attach media (atomic).
    ///
    /// Duplicate media ids are collapsed. An unknown media id rolls back the
    /// whole insert and reports NotFound.
    pub async fn create(
        &self,
        author_id: i64,
        content: TweetContent,
        media_ids: &[i64],
    ) -> Result<i64, DbError> {
        let mut tx = self.pool.begin().await?;

        let tweet_id: i64 =
            sqlx::query_scalar("INSERT INTO tweets (user_id, data) VALUES ($1, $2) RETURNING id")
                .bind(author_id)
                .bind(content.as_str())
                .fetch_one(&mut *tx)
                .await?;

        let mut media_ids = media_ids.to_vec();
        media_ids.sort_unstable();
        media_ids.dedup();

        if !media_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO medias_tweets (tweet_id, media_id)
                SELECT $1, UNNEST($2::BIGINT[])
                "#,
            )
            .bind(tweet_id)
            .bind(&media_ids[..])
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::on_insert(e, "attachment", "media", join_ids(&media_ids)))?;
        }

        tx.commit().await?;
        Ok(tweet_id)
    }

    /// Delete a tweet owned by `actor_id`.
    ///
    /// Likes and attachment links go with it via ON DELETE CASCADE. Media
    /// left without any tweet is returned; with `purge_media` those rows are
    /// deleted in the same transaction and only their objects remain for
    /// the caller to remove.
    pub async fn delete(
        &self,
        actor_id: i64,
        tweet_id: i64,
        purge_media: bool,
    ) -> Result<DeletedTweet, DbError> {
        let mut tx = self.pool.begin().await?;

        let author_id: Option<i64> =
            sqlx::query_scalar("SELECT user_id FROM tweets WHERE id = $1 FOR UPDATE")
                .bind(tweet_id)
                .fetch_optional(&mut *tx)
                .await?;

        match author_id {
            None => return Err(DbError::not_found("tweet", tweet_id)),
            Some(author) if author != actor_id => {
                return Err(DbError::Forbidden {
                    reason: "You can not delete other people's tweets!",
                })
            }
            Some(_) => {}
        }

        let media_ids: Vec<i64> =
            sqlx::query_scalar("SELECT media_id FROM medias_tweets WHERE tweet_id = $1")
                .bind(tweet_id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(tweet_id)
            .execute(&mut *tx)
            .await?;

        let orphaned_media = if purge_media {
            MediaRepo::purge_orphans_in(&mut tx, &media_ids).await?
        } else {
            MediaRepo::orphans_in(&mut tx, &media_ids).await?
        };

        tx.commit().await?;
        Ok(DeletedTweet {
            tweet_id,
            orphaned_media,
            media_purged: purge_media,
        })
    }

    /// Feed for `viewer_id`: tweets by followed users and by the viewer,
    /// ordered by like count (desc) then newest id first.
    pub async fn feed(&self, viewer_id: i64, page: Pagination) -> Result<Page<FeedTweet>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                t.id,
                t.data,
                u.id AS author_id,
                u.username AS author_name,
                COUNT(l.user_id) AS like_count,
                COUNT(*) OVER() AS total
            FROM tweets t
            JOIN users u ON u.id = t.user_id
            LEFT JOIN likes l ON l.tweet_id = t.id
            WHERE t.user_id = $1
               OR t.user_id IN (SELECT f.user_id FROM followers f WHERE f.follower_id = $1)
            GROUP BY t.id, u.id, u.username
            ORDER BY like_count DESC, t.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(viewer_id)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(self.pool)
        .await?;

        let total = match rows.first() {
            Some(r) => r.get::<i64, _>("total"),
            None if page.offset == 0 => 0,
            // Window count is unavailable past the last row
            None => self.feed_len(viewer_id).await?,
        };
        let ranked: Vec<FeedRow> = rows
            .into_iter()
            .map(|r| FeedRow {
                id: r.get("id"),
                content: r.get("data"),
                author: UserRef {
                    id: r.get("author_id"),
                    name: r.get("author_name"),
                },
            })
            .collect();

        let ids: Vec<i64> = ranked.iter().map(|t| t.id).collect();

        let likes: Vec<(i64, LikeRef)> = if ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query(
                r#"
                SELECT l.tweet_id, l.user_id, u.username
                FROM likes l
                JOIN users u ON u.id = l.user_id
                WHERE l.tweet_id = ANY($1)
                ORDER BY l.tweet_id, l.created_at, l.user_id
                "#,
            )
            .bind(&ids[..])
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(|r| {
                (
                    r.get("tweet_id"),
                    LikeRef {
                        user_id: r.get("user_id"),
                        name: r.get("username"),
                    },
                )
            })
            .collect()
        };

        let attachments: Vec<(i64, String)> = if ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query(
                r#"
                SELECT mt.tweet_id, m.link
                FROM medias_tweets mt
                JOIN medias m ON m.id = mt.media_id
                WHERE mt.tweet_id = ANY($1)
                ORDER BY mt.tweet_id, m.id
                "#,
            )
            .bind(&ids[..])
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(|r| (r.get("tweet_id"), r.get("link")))
            .collect()
        };

        Ok(Page {
            items: assemble_feed(ranked, likes, attachments),
            total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    /// Number of tweets in the viewer's feed.
    async fn feed_len(&self, viewer_id: i64) -> Result<i64, DbError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tweets t
            WHERE t.user_id = $1
               OR t.user_id IN (SELECT f.user_id FROM followers f WHERE f.follower_id = $1)
            "#,
        )
        .bind(viewer_id)
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }
}

/// Merge likes and attachment links into ranked rows, keeping rank order.
fn assemble_feed(
    ranked: Vec<FeedRow>,
    likes: Vec<(i64, LikeRef)>,
    attachments: Vec<(i64, String)>,
) -> Vec<FeedTweet> {
    let mut likes_by_tweet: HashMap<i64, Vec<LikeRef>> = HashMap::new();
    for (tweet_id, like) in likes {
        likes_by_tweet.entry(tweet_id).or_default().push(like);
    }

    let mut links_by_tweet: HashMap<i64, Vec<String>> = HashMap::new();
    for (tweet_id, link) in attachments {
        links_by_tweet.entry(tweet_id).or_default().push(link);
    }

    ranked
        .into_iter()
        .map(|row| FeedTweet {
            id: row.id,
            content: row.content,
            attachments: links_by_tweet.remove(&row.id).unwrap_or_default(),
            author: row.author,
            likes: likes_by_tweet.remove(&row.id).unwrap_or_default(),
        })
        .collect()
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
