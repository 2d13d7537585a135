//! End-to-end API flows against a real Postgres
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p microblog-server -- --ignored

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use rand::Rng;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use microblog_server::db::migrations;
use microblog_server::db::repos::{ApiKeyRepo, DbError, MediaRepo, TweetRepo, UserRepo};
use microblog_server::models::{Email, TweetContent, Username};
use microblog_server::{build_router, create_pool, AppState, MediaStorage, ServerConfig};

struct TestUser {
    id: i64,
    key: String,
}

struct TestApp {
    router: Router,
    pool: PgPool,
    storage: MediaStorage,
}

impl TestApp {
    async fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations failed");

        let storage = MediaStorage::in_memory("http://localhost:9000/media");
        let state = AppState::new(pool.clone(), storage.clone());
        let router = build_router(Arc::clone(&state), &ServerConfig::default());

        Self {
            router,
            pool,
            storage,
        }
    }

    async fn user(&self) -> TestUser {
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        let name = format!("u{}", suffix);
        let user = UserRepo::new(&self.pool)
            .create(
                Username::new(&name).unwrap(),
                Email::new(&format!("{}@test.io", name)).unwrap(),
            )
            .await
            .expect("user creation failed");

        let key = format!("key-{}-{}", name, rand::thread_rng().gen::<u64>());
        ApiKeyRepo::new(&self.pool)
            .issue(user.id, &key, None)
            .await
            .expect("key issue failed");

        TestUser { id: user.id, key }
    }

    async fn call(&self, method: &str, uri: &str, key: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("api-key", key);

        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn tweet(&self, user: &TestUser, text: &str, media: &[i64]) -> i64 {
        let (status, body) = self
            .call(
                "POST",
                "/api/tweets",
                &user.key,
                Some(json!({"tweet_data": text, "tweet_media_ids": media})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["tweet_id"].as_i64().unwrap()
    }

    async fn upload(&self, user: &TestUser, filename: &str, data: &str) -> (StatusCode, Value) {
        let boundary = "microblogboundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n{d}\r\n--{b}--\r\n",
            b = boundary,
            f = filename,
            d = data
        );

        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/medias")
                    .header("api-key", &user.key)
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

fn feed_ids(body: &Value) -> Vec<i64> {
    body["tweets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
#[ignore = "requires database"]
async fn unknown_key_is_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/api/users/me", "definitely-not-a-key", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_type"], "Unauthorized");
}

#[tokio::test]
#[ignore = "requires database"]
async fn feed_ranks_by_likes_then_recency() {
    let app = TestApp::new().await;
    let alice = app.user().await;
    let bob = app.user().await;
    let carol = app.user().await;

    let (status, _) = app
        .call("POST", &format!("/api/users/{}/follow", bob.id), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let old = app.tweet(&bob, "old and popular", &[]).await;
    let mine = app.tweet(&alice, "my own", &[]).await;
    let newer = app.tweet(&bob, "newer", &[]).await;
    let hidden = app.tweet(&carol, "not followed", &[]).await;

    for liker in [&alice, &carol] {
        let (status, _) = app
            .call("POST", &format!("/api/tweets/{}/likes", old), &liker.key, None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.call("GET", "/api/tweets", &alice.key, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], true);
    assert_eq!(body["total"], 3);

    let ids = feed_ids(&body);
    assert_eq!(ids, vec![old, newer, mine]);
    assert!(!ids.contains(&hidden));

    let top = &body["tweets"][0];
    assert_eq!(top["author"]["id"], bob.id);
    assert_eq!(top["likes"].as_array().unwrap().len(), 2);

    // Pagination keeps the total
    let (_, page) = app
        .call("GET", "/api/tweets?offset=1&limit=1", &alice.key, None)
        .await;
    assert_eq!(feed_ids(&page), vec![newer]);
    assert_eq!(page["total"], 3);
}

#[tokio::test]
#[ignore = "requires database"]
async fn only_author_can_delete() {
    let app = TestApp::new().await;
    let alice = app.user().await;
    let bob = app.user().await;

    let tweet = app.tweet(&alice, "mine", &[]).await;

    let (status, body) = app
        .call("DELETE", &format!("/api/tweets/{}", tweet), &bob.key, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_type"], "ActionForbidden");

    let (status, _) = app
        .call("DELETE", &format!("/api/tweets/{}", tweet), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call("DELETE", &format!("/api/tweets/{}", tweet), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "DataNotFound");
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_like_and_follow_are_rejected() {
    let app = TestApp::new().await;
    let alice = app.user().await;
    let bob = app.user().await;
    let tweet = app.tweet(&bob, "like me", &[]).await;

    let like = format!("/api/tweets/{}/likes", tweet);
    assert_eq!(app.call("POST", &like, &alice.key, None).await.0, StatusCode::CREATED);
    let (status, body) = app.call("POST", &like, &alice.key, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "UniqueViolationError");

    assert_eq!(app.call("DELETE", &like, &alice.key, None).await.0, StatusCode::OK);
    let (status, body) = app.call("DELETE", &like, &alice.key, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "DataNotFound");

    let follow = format!("/api/users/{}/follow", bob.id);
    assert_eq!(app.call("POST", &follow, &alice.key, None).await.0, StatusCode::CREATED);
    let (status, body) = app.call("POST", &follow, &alice.key, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "UniqueViolationError");

    let (_, body) = app.call("GET", &format!("/api/users/{}", bob.id), &alice.key, None).await;
    assert_eq!(body["user"]["followers"][0]["id"], alice.id);

    let (_, body) = app.call("GET", "/api/users/me", &alice.key, None).await;
    assert_eq!(body["user"]["following"][0]["id"], bob.id);
}

#[tokio::test]
#[ignore = "requires database"]
async fn self_follow_and_missing_targets() {
    let app = TestApp::new().await;
    let alice = app.user().await;

    let (status, body) = app
        .call("POST", &format!("/api/users/{}/follow", alice.id), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "ValueError");

    let (status, body) = app
        .call("POST", &format!("/api/users/{}/follow", i64::MAX), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "DataNotFound");

    let (status, _) = app
        .call("POST", &format!("/api/tweets/{}/likes", i64::MAX), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(
            "POST",
            "/api/tweets",
            &alice.key,
            Some(json!({"tweet_data": "ghost media", "tweet_media_ids": [i64::MAX]})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "DataNotFound");

    let (status, body) = app
        .call("POST", "/api/tweets", &alice.key, Some(json!({"tweet_data": "   "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "ValueError");
}

#[tokio::test]
#[ignore = "requires database"]
async fn media_attach_and_purge() {
    let app = TestApp::new().await;
    let alice = app.user().await;

    let (status, body) = app.upload(&alice, "cat.png", "meow").await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let media_id = body["media_id"].as_i64().unwrap();

    let media = MediaRepo::new(&app.pool).get(media_id).await.unwrap();
    assert!(media.object_key.ends_with(".png"));
    assert!(app.storage.get(&media.object_key).await.is_ok());

    let tweet = app.tweet(&alice, "look", &[media_id, media_id]).await;
    let links = MediaRepo::new(&app.pool).links_for_tweet(tweet).await.unwrap();
    assert_eq!(links, vec![media.link.clone()]);

    let (_, feed) = app.call("GET", "/api/tweets", &alice.key, None).await;
    let entry = feed["tweets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == tweet)
        .unwrap();
    assert_eq!(entry["attachments"], json!([media.link]));

    let (status, _) = app
        .call("DELETE", &format!("/api/tweets/{}?purge_media=true", tweet), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert!(MediaRepo::new(&app.pool).get(media_id).await.is_err());
    assert!(app.storage.get(&media.object_key).await.is_err());
}

#[tokio::test]
#[ignore = "requires database"]
async fn empty_upload_is_rejected() {
    let app = TestApp::new().await;
    let alice = app.user().await;

    let (status, body) = app.upload(&alice, "empty.txt", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "ValueError");
}

#[tokio::test]
#[ignore = "requires database"]
async fn feed_total_is_kept_past_the_last_page() {
    let app = TestApp::new().await;
    let alice = app.user().await;
    app.tweet(&alice, "one", &[]).await;
    app.tweet(&alice, "two", &[]).await;

    let (_, first) = app
        .call("GET", "/api/tweets?offset=0&limit=1", &alice.key, None)
        .await;
    assert_eq!(first["total"], 2);

    let (status, past_end) = app
        .call("GET", "/api/tweets?offset=10&limit=1", &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(past_end["tweets"], json!([]));
    assert_eq!(past_end["total"], 2);
}

#[tokio::test]
#[ignore = "requires database"]
async fn delete_without_purge_keeps_media() {
    let app = TestApp::new().await;
    let alice = app.user().await;

    let (_, body) = app.upload(&alice, "keep.png", "pixels").await;
    let media_id = body["media_id"].as_i64().unwrap();
    let tweet = app.tweet(&alice, "with media", &[media_id]).await;

    let (status, _) = app
        .call("DELETE", &format!("/api/tweets/{}", tweet), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let media = MediaRepo::new(&app.pool).get(media_id).await.unwrap();
    assert!(app.storage.get(&media.object_key).await.is_ok());
}

#[tokio::test]
#[ignore = "requires database"]
async fn shared_media_survives_purge_until_last_tweet() {
    let app = TestApp::new().await;
    let alice = app.user().await;

    let (_, body) = app.upload(&alice, "shared.gif", "frames").await;
    let media_id = body["media_id"].as_i64().unwrap();
    let first = app.tweet(&alice, "first use", &[media_id]).await;
    let second = app.tweet(&alice, "second use", &[media_id]).await;
    let media = MediaRepo::new(&app.pool).get(media_id).await.unwrap();

    let (status, _) = app
        .call("DELETE", &format!("/api/tweets/{}?purge_media=true", first), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(MediaRepo::new(&app.pool).get(media_id).await.is_ok());
    assert!(app.storage.get(&media.object_key).await.is_ok());

    let (status, _) = app
        .call("DELETE", &format!("/api/tweets/{}?purge_media=true", second), &alice.key, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(MediaRepo::new(&app.pool).get(media_id).await.is_err());
    assert!(app.storage.get(&media.object_key).await.is_err());
}

#[tokio::test]
#[ignore = "requires database"]
async fn purge_removes_media_rows_with_the_tweet() {
    let app = TestApp::new().await;
    let alice = app.user().await;

    let media_id = MediaRepo::new(&app.pool)
        .create("http://localhost:9000/media/x.png", "x.png")
        .await
        .unwrap();
    let repo = TweetRepo::new(&app.pool);
    let tweet = repo
        .create(alice.id, TweetContent::new("purge me").unwrap(), &[media_id])
        .await
        .unwrap();

    let deleted = repo.delete(alice.id, tweet, true).await.unwrap();

    assert!(deleted.media_purged);
    assert_eq!(deleted.orphaned_media.len(), 1);
    assert_eq!(deleted.orphaned_media[0].id, media_id);
    assert_eq!(deleted.orphaned_media[0].object_key, "x.png");
    assert!(MediaRepo::new(&app.pool).get(media_id).await.is_err());
}

#[tokio::test]
#[ignore = "requires database"]
async fn expired_key_is_unauthorized() {
    let app = TestApp::new().await;
    let alice = app.user().await;

    let expired = format!("expired-{}", rand::thread_rng().gen::<u64>());
    let keys = ApiKeyRepo::new(&app.pool);
    keys.issue(alice.id, &expired, Some(chrono::Duration::seconds(-60)))
        .await
        .unwrap();

    assert_eq!(keys.resolve(&expired).await.unwrap(), None);
    assert_eq!(keys.resolve(&alice.key).await.unwrap(), Some(alice.id));

    let (status, body) = app.call("GET", "/api/users/me", &expired, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_type"], "Unauthorized");
}

#[tokio::test]
#[ignore = "requires database"]
async fn concurrent_issue_of_same_key_stores_one() {
    let app = TestApp::new().await;
    let alice = app.user().await;
    let bob = app.user().await;

    let key = format!("race-{}", rand::thread_rng().gen::<u64>());
    let keys = ApiKeyRepo::new(&app.pool);

    let (a, b) = tokio::join!(keys.issue(alice.id, &key, None), keys.issue(bob.id, &key, None));

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(DbError::UniqueViolation { resource: "api key" }))));
}
