//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod tweet;
pub mod user;
pub mod pagination;

pub use validation::ValidationError;
pub use tweet::TweetContent;
pub use user::{Email, Username};
pub use pagination::{Page, Pagination, PaginationParams};
