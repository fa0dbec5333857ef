use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{GroupView, MessageRow, MessageView, NewChatMessage};
use crate::services::ChatStore;

/// Messages per history page, oldest first within the page.
pub const PAGE_SIZE: i64 = 25;

const MESSAGE_VIEW_SELECT: &str = r#"
    SELECT m.id, m.sender_id, su.username AS sender_username,
           m.receiver_id, ru.username AS receiver_username,
           m.group_id, m.content, m.received, m."read", m.created_at
    FROM chat_messages m
    JOIN users su ON su.id = m.sender_id
    LEFT JOIN users ru ON ru.id = m.receiver_id
"#;

/// Chat persistence: messages, groups, and membership lookups.
#[derive(Clone)]
pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a message and return it with participants populated.
    pub async fn create(&self, message: NewChatMessage) -> Result<MessageView, AppError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO chat_messages (id, sender_id, receiver_id, group_id, content, received)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(message.group_id)
        .bind(&message.content)
        .bind(message.received)
        .fetch_one(&self.pool)
        .await?;

        let row: MessageRow =
            sqlx::query_as(&format!("{MESSAGE_VIEW_SELECT} WHERE m.id = $1"))
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.into())
    }

    /// One page of the direct conversation between two users, ascending by
    /// creation time so clients can render top-to-bottom.
    pub async fn direct_history(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        page: i64,
    ) -> Result<Vec<MessageView>, AppError> {
        let offset = (page.max(1) - 1) * PAGE_SIZE;
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            r#"{MESSAGE_VIEW_SELECT}
            WHERE (m.sender_id = $1 AND m.receiver_id = $2)
               OR (m.sender_id = $2 AND m.receiver_id = $1)
            ORDER BY m.created_at ASC
            OFFSET $3 LIMIT $4"#
        ))
        .bind(user_a)
        .bind(user_b)
        .bind(offset)
        .bind(PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One page of a group's history, ascending by creation time.
    pub async fn group_history(
        &self,
        group_id: Uuid,
        page: i64,
    ) -> Result<Vec<MessageView>, AppError> {
        let offset = (page.max(1) - 1) * PAGE_SIZE;
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            r#"{MESSAGE_VIEW_SELECT}
            WHERE m.group_id = $1
            ORDER BY m.created_at ASC
            OFFSET $2 LIMIT $3"#
        ))
        .bind(group_id)
        .bind(offset)
        .bind(PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn user_exists(&self, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn group_exists(&self, group_id: Uuid) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chat_groups WHERE id = $1)")
                .bind(group_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM chat_group_members WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn group_member_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let members: Vec<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM chat_group_members WHERE group_id = $1")
                .bind(group_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(members)
    }

    /// Create a group and its membership rows in one transaction.
    /// The creator is always a member.
    pub async fn create_group(
        &self,
        group_name: &str,
        members: &[Uuid],
        created_by: Uuid,
    ) -> Result<GroupView, AppError> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO chat_groups (id, group_name, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(group_name)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let mut all_members: Vec<Uuid> = members.to_vec();
        if !all_members.contains(&created_by) {
            all_members.push(created_by);
        }

        for member in &all_members {
            sqlx::query(
                r#"
                INSERT INTO chat_group_members (group_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(member)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(GroupView {
            id,
            group_name: group_name.to_string(),
            members: all_members,
            created_by,
            created_at,
        })
    }
}

#[async_trait]
impl ChatStore for MessageService {
    async fn create(&self, message: NewChatMessage) -> Result<MessageView, AppError> {
        MessageService::create(self, message).await
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, AppError> {
        MessageService::user_exists(self, user_id).await
    }

    async fn group_exists(&self, group_id: Uuid) -> Result<bool, AppError> {
        MessageService::group_exists(self, group_id).await
    }

    async fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        MessageService::is_group_member(self, group_id, user_id).await
    }

    async fn group_member_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        MessageService::group_member_ids(self, group_id).await
    }
}
