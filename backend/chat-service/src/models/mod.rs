use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Minimal sender/receiver projection embedded in message payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub username: String,
}

/// A persisted chat message with its participants populated,
/// as rendered on both the REST and websocket surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub sender: UserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<UserRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    pub content: String,
    pub received: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub receiver_id: Option<Uuid>,
    pub receiver_username: Option<String>,
    pub group_id: Option<Uuid>,
    pub content: String,
    pub received: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for MessageView {
    fn from(row: MessageRow) -> Self {
        let receiver = match (row.receiver_id, row.receiver_username) {
            (Some(id), Some(username)) => Some(UserRef { id, username }),
            _ => None,
        };
        MessageView {
            id: row.id,
            sender: UserRef {
                id: row.sender_id,
                username: row.sender_username,
            },
            receiver,
            group_id: row.group_id,
            content: row.content,
            received: row.received,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

/// A message about to be written. Exactly one of `receiver_id` and
/// `group_id` is set; callers validate before constructing one.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub content: String,
    pub received: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub id: Uuid,
    pub group_name: String,
    pub members: Vec<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
