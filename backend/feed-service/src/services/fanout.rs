use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::warn;
use uuid::Uuid;

use super::{FeedStore, UserGraph};
use crate::error::AppError;
use crate::models::FeedItemType;

#[derive(Debug, Clone)]
pub struct FanoutFailure {
    pub recipient: Uuid,
    pub error: String,
}

/// Outcome of one fan-out run. A failed recipient never aborts the rest;
/// failures are collected here and logged by the caller.
#[derive(Debug, Default)]
pub struct FanoutReport {
    pub recipients: usize,
    pub delivered: usize,
    pub duplicates: usize,
    pub failures: Vec<FanoutFailure>,
}

impl FanoutReport {
    pub fn fully_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Push-model fan-out: on post/reply creation, writes a reference into every
/// recipient's feed with a bounded number of writes in flight.
pub struct FanoutEngine {
    graph: Arc<dyn UserGraph>,
    feeds: Arc<dyn FeedStore>,
    concurrency: usize,
}

impl FanoutEngine {
    pub fn new(graph: Arc<dyn UserGraph>, feeds: Arc<dyn FeedStore>, concurrency: usize) -> Self {
        Self {
            graph,
            feeds,
            concurrency: concurrency.max(1),
        }
    }

    /// Recipients: the author's followers, friends, and the author itself.
    pub async fn fan_out_post(
        &self,
        author_id: Uuid,
        post_id: Uuid,
    ) -> Result<FanoutReport, AppError> {
        let recipients = self.recipient_set(author_id, None).await?;
        Ok(self
            .deliver(recipients, FeedItemType::Post, post_id)
            .await)
    }

    /// Same recipient set as a post, plus the parent post's author so thread
    /// owners always see replies, deduplicated by identity.
    pub async fn fan_out_reply(
        &self,
        author_id: Uuid,
        reply_id: Uuid,
        parent_author_id: Uuid,
    ) -> Result<FanoutReport, AppError> {
        let recipients = self.recipient_set(author_id, Some(parent_author_id)).await?;
        Ok(self
            .deliver(recipients, FeedItemType::Reply, reply_id)
            .await)
    }

    async fn recipient_set(
        &self,
        author_id: Uuid,
        parent_author_id: Option<Uuid>,
    ) -> Result<Vec<Uuid>, AppError> {
        let mut set: HashSet<Uuid> = HashSet::new();
        set.extend(self.graph.followers_of(author_id).await?);
        set.extend(self.graph.friends_of(author_id).await?);
        set.insert(author_id);
        if let Some(parent_author) = parent_author_id {
            set.insert(parent_author);
        }
        Ok(set.into_iter().collect())
    }

    async fn deliver(
        &self,
        recipients: Vec<Uuid>,
        item_type: FeedItemType,
        item_id: Uuid,
    ) -> FanoutReport {
        let mut report = FanoutReport {
            recipients: recipients.len(),
            ..Default::default()
        };

        let results: Vec<(Uuid, Result<bool, AppError>)> =
            stream::iter(recipients.into_iter().map(|recipient| {
                let feeds = Arc::clone(&self.feeds);
                async move { (recipient, feeds.append(recipient, item_type, item_id).await) }
            }))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (recipient, result) in results {
            match result {
                Ok(true) => report.delivered += 1,
                Ok(false) => report.duplicates += 1,
                Err(e) => report.failures.push(FanoutFailure {
                    recipient,
                    error: e.to_string(),
                }),
            }
        }

        if !report.fully_delivered() {
            warn!(
                item_type = %item_type,
                item_id = %item_id,
                failed = report.failures.len(),
                delivered = report.delivered,
                "fan-out completed with failures"
            );
        }

        report
    }
}
