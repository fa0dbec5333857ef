use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::UserGraph;

/// Social-graph reads backed by the shared `follows`/`friendships` tables.
#[derive(Clone)]
pub struct PgUserGraph {
    pool: PgPool,
}

impl PgUserGraph {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserGraph for PgUserGraph {
    async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let followers = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT follower_id FROM follows
            WHERE followee_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(followers)
    }

    async fn friends_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        // Friendships are stored once per unordered pair; read both directions.
        let friends = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT CASE WHEN user_id = $1 THEN friend_id ELSE user_id END
            FROM friendships
            WHERE user_id = $1 OR friend_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }
}
