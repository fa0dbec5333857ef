#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use campus_feed_service::error::AppError;
use campus_feed_service::models::{
    FeedEntry, FeedItemType, ForumSummary, PostView, ReplyView, UserSummary,
};
use campus_feed_service::services::{ContentStore, FeedStore, UserGraph};

pub fn user(id: Uuid) -> UserSummary {
    UserSummary {
        id,
        username: format!("user-{}", &id.to_string()[..8]),
        role: "student".to_string(),
    }
}

pub fn post_view(id: Uuid, author_id: Uuid) -> PostView {
    PostView {
        id,
        content: "post content".to_string(),
        author: user(author_id),
        forum: Some(ForumSummary {
            id: Uuid::new_v4(),
            title: "General".to_string(),
        }),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn reply_view(id: Uuid, post_id: Uuid, author_id: Uuid) -> ReplyView {
    ReplyView {
        id,
        content: "reply content".to_string(),
        post_id,
        author: user(author_id),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct InMemoryGraph {
    pub followers: HashMap<Uuid, Vec<Uuid>>,
    pub friends: HashMap<Uuid, Vec<Uuid>>,
}

#[async_trait]
impl UserGraph for InMemoryGraph {
    async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(self.followers.get(&user_id).cloned().unwrap_or_default())
    }

    async fn friends_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(self.friends.get(&user_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct FeedStoreInner {
    next_seq: i64,
    feeds: HashMap<Uuid, Vec<FeedEntry>>,
    fail_for: HashSet<Uuid>,
}

/// Feed store fake with the same contract as the Postgres one: lazy feed
/// creation, idempotent appends, newest-first pages, injectable failures.
#[derive(Default)]
pub struct InMemoryFeedStore {
    inner: Mutex<FeedStoreInner>,
}

impl InMemoryFeedStore {
    pub fn fail_appends_for(&self, recipient: Uuid) {
        self.inner.lock().unwrap().fail_for.insert(recipient);
    }

    pub fn feed_exists(&self, user_id: Uuid) -> bool {
        self.inner.lock().unwrap().feeds.contains_key(&user_id)
    }

    pub fn entries(&self, user_id: Uuid) -> Vec<FeedEntry> {
        self.inner
            .lock()
            .unwrap()
            .feeds
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl FeedStore for InMemoryFeedStore {
    async fn append(
        &self,
        recipient: Uuid,
        item_type: FeedItemType,
        item_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_for.contains(&recipient) {
            return Err(AppError::Internal);
        }

        let duplicate = inner.feeds.get(&recipient).is_some_and(|entries| {
            entries
                .iter()
                .any(|e| e.item_type == item_type && e.item_id == item_id)
        });
        if duplicate {
            return Ok(false);
        }

        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.feeds.entry(recipient).or_default().insert(
            0,
            FeedEntry {
                seq,
                item_type,
                item_id,
                created_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn entries_page(
        &self,
        user_id: Uuid,
        before_seq: Option<i64>,
        limit: i64,
    ) -> Result<Vec<FeedEntry>, AppError> {
        let inner = self.inner.lock().unwrap();
        let entries = inner
            .feeds
            .get(&user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| before_seq.map_or(true, |seq| e.seq < seq))
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(entries)
    }
}

#[derive(Default)]
pub struct InMemoryContent {
    pub posts: Mutex<HashMap<Uuid, PostView>>,
    pub replies: Mutex<HashMap<Uuid, ReplyView>>,
}

impl InMemoryContent {
    pub fn add_post(&self, post: PostView) {
        self.posts.lock().unwrap().insert(post.id, post);
    }

    pub fn add_reply(&self, reply: ReplyView) {
        self.replies.lock().unwrap().insert(reply.id, reply);
    }

    pub fn remove_post(&self, id: Uuid) {
        self.posts.lock().unwrap().remove(&id);
    }
}

#[async_trait]
impl ContentStore for InMemoryContent {
    async fn post_view(&self, id: Uuid) -> Result<Option<PostView>, AppError> {
        Ok(self.posts.lock().unwrap().get(&id).cloned())
    }

    async fn reply_view(&self, id: Uuid) -> Result<Option<ReplyView>, AppError> {
        Ok(self.replies.lock().unwrap().get(&id).cloned())
    }
}
