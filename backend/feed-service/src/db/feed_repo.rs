use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{FeedEntry, FeedItemType};
use crate::services::FeedStore;

#[derive(Debug, sqlx::FromRow)]
struct FeedEntryRow {
    seq: i64,
    item_type: String,
    item_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<FeedEntryRow> for FeedEntry {
    type Error = AppError;

    fn try_from(row: FeedEntryRow) -> Result<Self, Self::Error> {
        let item_type = FeedItemType::from_db(&row.item_type).ok_or_else(|| {
            tracing::error!(item_type = %row.item_type, seq = row.seq, "unknown feed item type in store");
            AppError::Internal
        })?;
        Ok(FeedEntry {
            seq: row.seq,
            item_type,
            item_id: row.item_id,
            created_at: row.created_at,
        })
    }
}

/// Feed store backed by `feeds` + `feed_entries`. Appends are idempotent on
/// (user, item_type, item_id) so fan-out retries never double-insert.
#[derive(Clone)]
pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn append(
        &self,
        recipient: Uuid,
        item_type: FeedItemType,
        item_id: Uuid,
    ) -> Result<bool, AppError> {
        // Lazily create the feed document on the first fan-out hit.
        sqlx::query(
            r#"
            INSERT INTO feeds (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(recipient)
        .execute(&self.pool)
        .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO feed_entries (user_id, item_type, item_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, item_type, item_id) DO NOTHING
            "#,
        )
        .bind(recipient)
        .bind(item_type.as_str())
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn entries_page(
        &self,
        user_id: Uuid,
        before_seq: Option<i64>,
        limit: i64,
    ) -> Result<Vec<FeedEntry>, AppError> {
        let rows = sqlx::query_as::<_, FeedEntryRow>(
            r#"
            SELECT seq, item_type, item_id, created_at
            FROM feed_entries
            WHERE user_id = $1
              AND ($2::bigint IS NULL OR seq < $2)
            ORDER BY seq DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(before_seq)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FeedEntry::try_from).collect()
    }
}
