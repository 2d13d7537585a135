//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Borrows the pool, one short-lived repo per request
//! - Lets unique / foreign key constraints decide, then classifies the error
//! - Uses transactions for multi-step operations

pub mod error;
pub mod users;
pub mod api_keys;
pub mod follows;
pub mod tweets;
pub mod likes;
pub mod medias;

pub use error::DbError;
pub use users::{User, UserProfile, UserRef, UserRepo};
pub use api_keys::ApiKeyRepo;
pub use follows::FollowRepo;
pub use tweets::{DeletedTweet, FeedTweet, LikeRef, TweetRepo};
pub use likes::LikeRepo;
pub use medias::{Media, MediaRepo, OrphanMedia};
