use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of entity a feed entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedItemType {
    Post,
    Reply,
}

impl FeedItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Reply => "reply",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "post" => Some(Self::Post),
            "reply" => Some(Self::Reply),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeedItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One stored reference in a user's feed. `seq` is the store's insertion
/// counter; newest-first reads are `ORDER BY seq DESC`.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub seq: i64,
    pub item_type: FeedItemType,
    pub item_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumSummary {
    pub id: Uuid,
    pub title: String,
}

/// Post with author and forum populated, ready to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub content: String,
    pub author: UserSummary,
    /// None when the containing forum has since been deleted.
    pub forum: Option<ForumSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reply with author populated. The parent post is resolved separately so
/// the reader can attach thread context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A feed entry resolved into its full view object.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ResolvedFeedItem {
    #[serde(rename = "post")]
    Post { item: PostView },
    #[serde(rename = "reply")]
    Reply { item: ReplyView, post: PostView },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub feed_items: Vec<ResolvedFeedItem>,
    /// Entries on this page whose target entity no longer exists. They are
    /// dropped from `feed_items` but counted here for observability.
    pub orphaned: usize,
    pub cursor: Option<String>,
    pub has_more: bool,
}

/// Raw post row as stored, before population.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub forum_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw reply row as stored, before population.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
