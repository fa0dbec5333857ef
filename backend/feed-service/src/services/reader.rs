use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use uuid::Uuid;

use super::{ContentStore, FeedStore};
use crate::error::AppError;
use crate::models::{FeedEntry, FeedItemType, FeedResponse, ResolvedFeedItem};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pull-model feed materialization: resolves stored references into typed
/// view objects, silently dropping entries whose target has vanished.
pub struct FeedReader {
    feeds: Arc<dyn FeedStore>,
    content: Arc<dyn ContentStore>,
}

impl FeedReader {
    pub fn new(feeds: Arc<dyn FeedStore>, content: Arc<dyn ContentStore>) -> Self {
        Self { feeds, content }
    }

    pub async fn read(
        &self,
        user_id: Uuid,
        cursor: Option<&str>,
        limit: i64,
    ) -> Result<FeedResponse, AppError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let before_seq = decode_cursor(cursor)?;

        // One extra row tells us whether another page exists.
        let mut entries = self
            .feeds
            .entries_page(user_id, before_seq, limit + 1)
            .await?;
        let has_more = entries.len() as i64 > limit;
        entries.truncate(limit as usize);

        let cursor = if has_more {
            entries.last().map(|e| encode_cursor(e.seq))
        } else {
            None
        };

        let mut feed_items = Vec::with_capacity(entries.len());
        let mut orphaned = 0;
        for entry in &entries {
            match self.resolve(entry).await? {
                Some(item) => feed_items.push(item),
                None => orphaned += 1,
            }
        }

        Ok(FeedResponse {
            feed_items,
            orphaned,
            cursor,
            has_more,
        })
    }

    /// `None` means the entry is orphaned: the post or reply was deleted, or
    /// a reply's parent post no longer exists.
    async fn resolve(&self, entry: &FeedEntry) -> Result<Option<ResolvedFeedItem>, AppError> {
        match entry.item_type {
            FeedItemType::Post => Ok(self
                .content
                .post_view(entry.item_id)
                .await?
                .map(|item| ResolvedFeedItem::Post { item })),
            FeedItemType::Reply => {
                let Some(reply) = self.content.reply_view(entry.item_id).await? else {
                    return Ok(None);
                };
                match self.content.post_view(reply.post_id).await? {
                    Some(post) => Ok(Some(ResolvedFeedItem::Reply { item: reply, post })),
                    None => Ok(None),
                }
            }
        }
    }
}

fn encode_cursor(seq: i64) -> String {
    STANDARD.encode(seq.to_string())
}

fn decode_cursor(cursor: Option<&str>) -> Result<Option<i64>, AppError> {
    match cursor {
        Some(cursor) if !cursor.is_empty() => {
            let decoded = STANDARD
                .decode(cursor)
                .map_err(|_| AppError::BadRequest("Invalid cursor format".to_string()))?;
            let seq = String::from_utf8(decoded)
                .map_err(|_| AppError::BadRequest("Invalid cursor encoding".to_string()))?
                .parse::<i64>()
                .map_err(|_| AppError::BadRequest("Invalid cursor value".to_string()))?;
            Ok(Some(seq))
        }
        _ => Ok(None),
    }
}
