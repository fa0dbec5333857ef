use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::models::NewChatMessage;
use crate::services::ChatStore;
use crate::websocket::message_types::{
    AckStatus, ChatType, LastMessage, SendMessagePayload, WsInboundEvent, WsOutboundEvent,
};
use crate::websocket::{ConnectionRegistry, SubscriberId};

/// Dispatch one parsed client event. Runs off the actor thread so slow
/// database work never blocks the socket's read loop.
pub async fn handle_event(
    event: WsInboundEvent,
    user_id: Uuid,
    subscriber_id: SubscriberId,
    registry: ConnectionRegistry,
    messages: Arc<dyn ChatStore>,
) {
    match event {
        WsInboundEvent::JoinRoom { room_id } => {
            registry.join_room(&room_id, subscriber_id).await;
            send_room_event(
                &registry,
                &room_id,
                &WsOutboundEvent::UserJoined {
                    user_id,
                    room_id: room_id.clone(),
                },
            )
            .await;
        }
        // Leaving is silent; clients do not get a counterpart to userJoined.
        WsInboundEvent::LeaveRoom { room_id } => {
            registry.leave_room(&room_id, subscriber_id).await;
        }
        WsInboundEvent::SendMessage(payload) => {
            handle_send_message(payload, user_id, subscriber_id, &registry, messages.as_ref())
                .await;
        }
        WsInboundEvent::GroupCreated { group } => {
            let event = WsOutboundEvent::GroupCreated { group };
            if let Ok(body) = serde_json::to_string(&event) {
                registry.broadcast_all(body).await;
            }
        }
    }
}

async fn handle_send_message(
    payload: SendMessagePayload,
    user_id: Uuid,
    subscriber_id: SubscriberId,
    registry: &ConnectionRegistry,
    messages: &dyn ChatStore,
) {
    if let Err(reason) = payload.validate(user_id) {
        ack_error(registry, subscriber_id, &payload.ack_id, reason).await;
        return;
    }

    if let Some(group_id) = payload.group_id {
        match messages.is_group_member(group_id, payload.sender_id).await {
            Ok(true) => {}
            Ok(false) => {
                ack_error(
                    registry,
                    subscriber_id,
                    &payload.ack_id,
                    "sender is not a member of this group".to_string(),
                )
                .await;
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, %group_id, "membership check failed");
                ack_error(
                    registry,
                    subscriber_id,
                    &payload.ack_id,
                    "failed to save message".to_string(),
                )
                .await;
                return;
            }
        }
    }

    let new_message = NewChatMessage {
        sender_id: payload.sender_id,
        receiver_id: payload.receiver_id,
        group_id: payload.group_id,
        content: payload.message.clone(),
        received: false,
    };

    let view = match messages.create(new_message).await {
        Ok(view) => view,
        Err(e) => {
            tracing::error!(error = %e, "failed to persist chat message");
            ack_error(
                registry,
                subscriber_id,
                &payload.ack_id,
                "failed to save message".to_string(),
            )
            .await;
            return;
        }
    };

    send_room_event(
        registry,
        &payload.room_id,
        &WsOutboundEvent::Message {
            message: view.clone(),
        },
    )
    .await;

    notify_chat_updated(registry, messages, &payload).await;

    let ack = WsOutboundEvent::Ack {
        ack_id: payload.ack_id.clone(),
        status: AckStatus::Success,
        message_id: Some(view.id),
        error: None,
    };
    send_subscriber_event(registry, subscriber_id, &ack).await;
}

/// Push chatUpdated to the participants of the conversation, not the
/// whole server. Group sends target every durable member; direct sends
/// target both parties, each keyed by the other.
async fn notify_chat_updated(
    registry: &ConnectionRegistry,
    messages: &dyn ChatStore,
    payload: &SendMessagePayload,
) {
    let updated_at = Utc::now();

    if let Some(group_id) = payload.group_id {
        let members = match messages.group_member_ids(group_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(error = %e, %group_id, "could not load members for chat update");
                return;
            }
        };
        let event = WsOutboundEvent::ChatUpdated {
            chat_id: group_id,
            last_message: LastMessage {
                content: payload.message.clone(),
            },
            updated_at,
            chat_type: ChatType::Group,
        };
        if let Ok(body) = serde_json::to_string(&event) {
            for member in members {
                registry.send_to_user(member, body.clone()).await;
            }
        }
    } else if let Some(receiver_id) = payload.receiver_id {
        for (target, chat_id) in direct_chat_updates(payload.sender_id, receiver_id) {
            let event = WsOutboundEvent::ChatUpdated {
                chat_id,
                last_message: LastMessage {
                    content: payload.message.clone(),
                },
                updated_at,
                chat_type: ChatType::Individual,
            };
            if let Ok(body) = serde_json::to_string(&event) {
                registry.send_to_user(target, body).await;
            }
        }
    }
}

/// For a direct message, each participant's chat list keys the
/// conversation by the other party.
pub fn direct_chat_updates(sender: Uuid, receiver: Uuid) -> [(Uuid, Uuid); 2] {
    [(sender, receiver), (receiver, sender)]
}

async fn ack_error(
    registry: &ConnectionRegistry,
    subscriber_id: SubscriberId,
    ack_id: &str,
    error: String,
) {
    let ack = WsOutboundEvent::Ack {
        ack_id: ack_id.to_string(),
        status: AckStatus::Error,
        message_id: None,
        error: Some(error),
    };
    send_subscriber_event(registry, subscriber_id, &ack).await;
}

async fn send_room_event(registry: &ConnectionRegistry, room: &str, event: &WsOutboundEvent) {
    match serde_json::to_string(event) {
        Ok(body) => registry.broadcast_room(room, body).await,
        Err(e) => tracing::error!(error = %e, "failed to serialize outbound event"),
    }
}

async fn send_subscriber_event(
    registry: &ConnectionRegistry,
    subscriber_id: SubscriberId,
    event: &WsOutboundEvent,
) {
    match serde_json::to_string(event) {
        Ok(body) => registry.send_to_subscriber(subscriber_id, body).await,
        Err(e) => tracing::error!(error = %e, "failed to serialize outbound event"),
    }
}
