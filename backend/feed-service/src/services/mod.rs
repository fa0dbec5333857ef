use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{FeedEntry, FeedItemType, PostView, ReplyView};

pub mod fanout;
pub mod reader;

pub use fanout::{FanoutEngine, FanoutFailure, FanoutReport};
pub use reader::FeedReader;

/// Read side of the social graph. Identity and relationship management live
/// in another service; fan-out only ever reads it.
#[async_trait]
pub trait UserGraph: Send + Sync {
    /// Users who follow `user_id`. This is the distribution list for fan-out.
    async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    async fn friends_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError>;
}

/// Per-user persisted feed of item references.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Append one reference to `recipient`'s feed, creating the feed lazily.
    /// Returns `false` when the (recipient, item) pair was already present,
    /// which makes fan-out retries safe.
    async fn append(
        &self,
        recipient: Uuid,
        item_type: FeedItemType,
        item_id: Uuid,
    ) -> Result<bool, AppError>;

    /// Newest-first page of `user_id`'s feed, restricted to entries strictly
    /// older than `before_seq` when given.
    async fn entries_page(
        &self,
        user_id: Uuid,
        before_seq: Option<i64>,
        limit: i64,
    ) -> Result<Vec<FeedEntry>, AppError>;
}

/// Post/reply lookups with author and forum populated. Returns `None` for
/// entities that no longer exist; the reader treats those as orphans.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn post_view(&self, id: Uuid) -> Result<Option<PostView>, AppError>;

    async fn reply_view(&self, id: Uuid) -> Result<Option<ReplyView>, AppError>;
}
