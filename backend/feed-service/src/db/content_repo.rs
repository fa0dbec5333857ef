use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ForumSummary, PostRecord, PostView, ReplyRecord, ReplyView, UserSummary};
use crate::services::ContentStore;

#[derive(Debug, sqlx::FromRow)]
struct PostViewRow {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: Uuid,
    author_username: String,
    author_role: String,
    forum_id: Option<Uuid>,
    forum_title: Option<String>,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let forum = match (row.forum_id, row.forum_title) {
            (Some(id), Some(title)) => Some(ForumSummary { id, title }),
            _ => None,
        };
        PostView {
            id: row.id,
            content: row.content,
            author: UserSummary {
                id: row.author_id,
                username: row.author_username,
                role: row.author_role,
            },
            forum,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReplyViewRow {
    id: Uuid,
    content: String,
    post_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: Uuid,
    author_username: String,
    author_role: String,
}

impl From<ReplyViewRow> for ReplyView {
    fn from(row: ReplyViewRow) -> Self {
        ReplyView {
            id: row.id,
            content: row.content,
            post_id: row.post_id,
            author: UserSummary {
                id: row.author_id,
                username: row.author_username,
                role: row.author_role,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.content, p.created_at, p.updated_at,
           u.id AS author_id, u.username AS author_username, u.role AS author_role,
           f.id AS forum_id, f.title AS forum_title
    FROM posts p
    JOIN users u ON u.id = p.user_id
    LEFT JOIN forums f ON f.id = p.forum_id
"#;

const REPLY_VIEW_SELECT: &str = r#"
    SELECT r.id, r.content, r.post_id, r.created_at, r.updated_at,
           u.id AS author_id, u.username AS author_username, u.role AS author_role
    FROM replies r
    JOIN users u ON u.id = r.user_id
"#;

/// Posts and replies inside discussion forums. Deletes are plain row deletes
/// on purpose: feed entries and child replies are left behind as orphans and
/// the reader tolerates them.
#[derive(Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn forum_exists(&self, forum_id: Uuid) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM forums WHERE id = $1)"#)
                .bind(forum_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn create_post(
        &self,
        author_id: Uuid,
        forum_id: Uuid,
        content: &str,
    ) -> Result<PostRecord, AppError> {
        let post = sqlx::query_as::<_, PostRecord>(
            r#"
            INSERT INTO posts (id, user_id, forum_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, forum_id, content, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(forum_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn post_record(&self, id: Uuid) -> Result<Option<PostRecord>, AppError> {
        let post = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT id, user_id, forum_id, content, created_at, updated_at
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn update_post_content(
        &self,
        id: Uuid,
        content: &str,
    ) -> Result<Option<PostRecord>, AppError> {
        let post = sqlx::query_as::<_, PostRecord>(
            r#"
            UPDATE posts SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, forum_id, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM posts WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn posts_by_forum(&self, forum_id: Uuid) -> Result<Vec<PostView>, AppError> {
        let query = format!("{POST_VIEW_SELECT} WHERE p.forum_id = $1 ORDER BY p.created_at DESC");
        let rows = sqlx::query_as::<_, PostViewRow>(&query)
            .bind(forum_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }

    pub async fn create_reply(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: &str,
    ) -> Result<ReplyRecord, AppError> {
        let reply = sqlx::query_as::<_, ReplyRecord>(
            r#"
            INSERT INTO replies (id, post_id, user_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, user_id, content, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(reply)
    }

    pub async fn reply_record(&self, id: Uuid) -> Result<Option<ReplyRecord>, AppError> {
        let reply = sqlx::query_as::<_, ReplyRecord>(
            r#"
            SELECT id, post_id, user_id, content, created_at, updated_at
            FROM replies WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reply)
    }

    pub async fn update_reply_content(
        &self,
        id: Uuid,
        content: &str,
    ) -> Result<Option<ReplyRecord>, AppError> {
        let reply = sqlx::query_as::<_, ReplyRecord>(
            r#"
            UPDATE replies SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, post_id, user_id, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reply)
    }

    pub async fn delete_reply(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM replies WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn replies_by_post(&self, post_id: Uuid) -> Result<Vec<ReplyView>, AppError> {
        let query = format!("{REPLY_VIEW_SELECT} WHERE r.post_id = $1 ORDER BY r.created_at ASC");
        let rows = sqlx::query_as::<_, ReplyViewRow>(&query)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ReplyView::from).collect())
    }
}

#[async_trait]
impl ContentStore for ContentRepository {
    async fn post_view(&self, id: Uuid) -> Result<Option<PostView>, AppError> {
        let query = format!("{POST_VIEW_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostViewRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PostView::from))
    }

    async fn reply_view(&self, id: Uuid) -> Result<Option<ReplyView>, AppError> {
        let query = format!("{REPLY_VIEW_SELECT} WHERE r.id = $1");
        let row = sqlx::query_as::<_, ReplyViewRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ReplyView::from))
    }
}
