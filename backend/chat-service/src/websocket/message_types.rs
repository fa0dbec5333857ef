use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::MessageView;

/// Events a client may send over the websocket.
///
/// The wire format is a JSON object with a `type` discriminator,
/// e.g. `{"type":"joinRoom","roomId":"course:42"}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum WsInboundEvent {
    #[serde(rename = "joinRoom", rename_all = "camelCase")]
    JoinRoom { room_id: String },

    #[serde(rename = "leaveRoom", rename_all = "camelCase")]
    LeaveRoom { room_id: String },

    #[serde(rename = "sendMessage")]
    SendMessage(SendMessagePayload),

    /// Client-side relay fired after a group is created over REST.
    #[serde(rename = "groupCreated")]
    GroupCreated { group: serde_json::Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Client-chosen correlation id echoed back in the ack.
    pub ack_id: String,
    pub sender_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    pub message: String,
    pub room_id: String,
}

impl SendMessagePayload {
    /// Reject malformed sends before touching the database. The declared
    /// sender must be the connection's authenticated user, and exactly one
    /// of receiver/group must be set.
    pub fn validate(&self, connection_user: Uuid) -> Result<(), String> {
        if self.sender_id != connection_user {
            return Err("senderId does not match the authenticated user".to_string());
        }
        if self.message.trim().is_empty() {
            return Err("message must not be empty".to_string());
        }
        match (self.receiver_id, self.group_id) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err("exactly one of receiverId or groupId is required".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Individual,
    Group,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastMessage {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
    Error,
}

/// Events the server pushes to clients. Same `type`-tagged framing as
/// the inbound side.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WsOutboundEvent {
    #[serde(rename = "userJoined", rename_all = "camelCase")]
    UserJoined { user_id: Uuid, room_id: String },

    #[serde(rename = "message")]
    Message { message: MessageView },

    /// Tells a participant that one of their chat-list entries has a new
    /// last message. `chat_id` is the conversation key from the receiving
    /// user's perspective: the other party for direct chats, the group id
    /// for group chats.
    #[serde(rename = "chatUpdated", rename_all = "camelCase")]
    ChatUpdated {
        chat_id: Uuid,
        last_message: LastMessage,
        updated_at: DateTime<Utc>,
        chat_type: ChatType,
    },

    /// Per-send receipt correlated by `ack_id`; delivered only to the
    /// connection that issued the send.
    #[serde(rename = "ack", rename_all = "camelCase")]
    Ack {
        ack_id: String,
        status: AckStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message_id: Option<Uuid>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "groupCreated")]
    GroupCreated { group: serde_json::Value },

    #[serde(rename = "pollExpired")]
    PollExpired { payload: serde_json::Value },
}
