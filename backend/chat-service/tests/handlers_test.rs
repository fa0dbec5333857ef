use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use campus_chat_service::error::AppError;
use campus_chat_service::middleware::AuthenticatedUser;
use campus_chat_service::models::{MessageView, NewChatMessage, UserRef};
use campus_chat_service::routes::messages::{submit_message, CreateMessageRequest};
use campus_chat_service::services::ChatStore;
use campus_chat_service::websocket::handlers::handle_event;
use campus_chat_service::websocket::message_types::{SendMessagePayload, WsInboundEvent};
use campus_chat_service::websocket::ConnectionRegistry;

#[derive(Default)]
struct StoreInner {
    users: HashMap<Uuid, String>,
    groups: HashMap<Uuid, Vec<Uuid>>,
    messages: Vec<MessageView>,
    fail_creates: bool,
}

#[derive(Default)]
struct InMemoryChatStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryChatStore {
    fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(id, username.to_string());
        id
    }

    fn add_group(&self, members: &[Uuid]) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().groups.insert(id, members.to_vec());
        id
    }

    fn fail_creates(&self) {
        self.inner.lock().unwrap().fail_creates = true;
    }

    fn stored(&self) -> Vec<MessageView> {
        self.inner.lock().unwrap().messages.clone()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn create(&self, message: NewChatMessage) -> Result<MessageView, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_creates {
            return Err(AppError::Internal);
        }

        let username = |id: &Uuid, users: &HashMap<Uuid, String>| {
            users.get(id).cloned().unwrap_or_else(|| "unknown".to_string())
        };
        let view = MessageView {
            id: Uuid::new_v4(),
            sender: UserRef {
                id: message.sender_id,
                username: username(&message.sender_id, &inner.users),
            },
            receiver: message.receiver_id.map(|id| UserRef {
                id,
                username: username(&id, &inner.users),
            }),
            group_id: message.group_id,
            content: message.content,
            received: message.received,
            read: false,
            created_at: Utc::now(),
        };
        inner.messages.push(view.clone());
        Ok(view)
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.inner.lock().unwrap().users.contains_key(&user_id))
    }

    async fn group_exists(&self, group_id: Uuid) -> Result<bool, AppError> {
        Ok(self.inner.lock().unwrap().groups.contains_key(&group_id))
    }

    async fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .groups
            .get(&group_id)
            .map(|members| members.contains(&user_id))
            .unwrap_or(false))
    }

    async fn group_member_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .groups
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }
}

fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<Value> {
    let mut events = Vec::new();
    while let Ok(raw) = rx.try_recv() {
        events.push(serde_json::from_str(&raw).unwrap());
    }
    events
}

fn send_event(payload: SendMessagePayload) -> WsInboundEvent {
    WsInboundEvent::SendMessage(payload)
}

#[tokio::test]
async fn non_member_group_send_gets_an_error_ack_and_nothing_is_stored() {
    let store = Arc::new(InMemoryChatStore::default());
    let registry = ConnectionRegistry::new();

    let outsider = store.add_user("mallory");
    let member = store.add_user("grace");
    let group = store.add_group(&[member]);
    let room = format!("group:{group}");

    let (outsider_sub, mut outsider_rx) = registry.register(outsider).await;
    let (member_sub, mut member_rx) = registry.register(member).await;
    registry.join_room(&room, outsider_sub).await;
    registry.join_room(&room, member_sub).await;

    let event = send_event(SendMessagePayload {
        ack_id: "a-1".to_string(),
        sender_id: outsider,
        receiver_id: None,
        group_id: Some(group),
        message: "let me in".to_string(),
        room_id: room,
    });
    handle_event(event, outsider, outsider_sub, registry.clone(), store.clone()).await;

    let outsider_events = drain(&mut outsider_rx);
    assert_eq!(outsider_events.len(), 1);
    assert_eq!(outsider_events[0]["type"], "ack");
    assert_eq!(outsider_events[0]["ackId"], "a-1");
    assert_eq!(outsider_events[0]["status"], "error");

    assert!(drain(&mut member_rx).is_empty());
    assert!(store.stored().is_empty());
}

#[tokio::test]
async fn direct_send_broadcasts_to_the_room_and_updates_both_parties() {
    let store = Arc::new(InMemoryChatStore::default());
    let registry = ConnectionRegistry::new();

    let sender = store.add_user("ada");
    let receiver = store.add_user("grace");
    let bystander = store.add_user("dan");
    let room = "dm:ada:grace".to_string();

    let (sender_sub, mut sender_rx) = registry.register(sender).await;
    let (receiver_sub, mut receiver_rx) = registry.register(receiver).await;
    // The receiver's second device is connected but not in the room.
    let (_receiver_phone, mut phone_rx) = registry.register(receiver).await;
    let (_bystander_sub, mut bystander_rx) = registry.register(bystander).await;
    registry.join_room(&room, sender_sub).await;
    registry.join_room(&room, receiver_sub).await;

    let event = send_event(SendMessagePayload {
        ack_id: "a-2".to_string(),
        sender_id: sender,
        receiver_id: Some(receiver),
        group_id: None,
        message: "lab at noon?".to_string(),
        room_id: room,
    });
    handle_event(event, sender, sender_sub, registry.clone(), store.clone()).await;

    let stored = store.stored();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].received);

    // Sender connection: room message, own chat update, then the ack.
    let sender_events = drain(&mut sender_rx);
    assert_eq!(sender_events.len(), 3);
    assert_eq!(sender_events[0]["type"], "message");
    assert_eq!(sender_events[0]["message"]["content"], "lab at noon?");
    assert_eq!(sender_events[1]["type"], "chatUpdated");
    assert_eq!(sender_events[1]["chatId"], serde_json::json!(receiver));
    assert_eq!(sender_events[1]["chatType"], "individual");
    assert_eq!(sender_events[2]["type"], "ack");
    assert_eq!(sender_events[2]["status"], "success");
    assert_eq!(sender_events[2]["messageId"], serde_json::json!(stored[0].id));

    // Receiver's in-room connection: message plus a chat update keyed by
    // the sender.
    let receiver_events = drain(&mut receiver_rx);
    assert_eq!(receiver_events.len(), 2);
    assert_eq!(receiver_events[0]["type"], "message");
    assert_eq!(receiver_events[1]["type"], "chatUpdated");
    assert_eq!(receiver_events[1]["chatId"], serde_json::json!(sender));

    // The second device sees the chat update even though it never joined.
    let phone_events = drain(&mut phone_rx);
    assert_eq!(phone_events.len(), 1);
    assert_eq!(phone_events[0]["type"], "chatUpdated");

    assert!(drain(&mut bystander_rx).is_empty());
}

#[tokio::test]
async fn group_chat_updates_reach_members_only() {
    let store = Arc::new(InMemoryChatStore::default());
    let registry = ConnectionRegistry::new();

    let sender = store.add_user("ada");
    let offline_room_member = store.add_user("grace");
    let outsider = store.add_user("dan");
    let group = store.add_group(&[sender, offline_room_member]);
    let room = format!("group:{group}");

    let (sender_sub, mut sender_rx) = registry.register(sender).await;
    // A member who is connected but has not joined the room.
    let (_member_sub, mut member_rx) = registry.register(offline_room_member).await;
    let (_outsider_sub, mut outsider_rx) = registry.register(outsider).await;
    registry.join_room(&room, sender_sub).await;

    let event = send_event(SendMessagePayload {
        ack_id: "a-3".to_string(),
        sender_id: sender,
        receiver_id: None,
        group_id: Some(group),
        message: "standup in 5".to_string(),
        room_id: room,
    });
    handle_event(event, sender, sender_sub, registry.clone(), store.clone()).await;

    let member_events = drain(&mut member_rx);
    assert_eq!(member_events.len(), 1);
    assert_eq!(member_events[0]["type"], "chatUpdated");
    assert_eq!(member_events[0]["chatId"], serde_json::json!(group));
    assert_eq!(member_events[0]["chatType"], "group");

    assert!(drain(&mut outsider_rx).is_empty());

    let sender_events = drain(&mut sender_rx);
    assert_eq!(sender_events.last().unwrap()["type"], "ack");
    assert_eq!(sender_events.last().unwrap()["status"], "success");
}

#[tokio::test]
async fn failed_persistence_acks_an_error_and_broadcasts_nothing() {
    let store = Arc::new(InMemoryChatStore::default());
    let registry = ConnectionRegistry::new();

    let sender = store.add_user("ada");
    let receiver = store.add_user("grace");
    store.fail_creates();

    let (sender_sub, mut sender_rx) = registry.register(sender).await;
    let (receiver_sub, mut receiver_rx) = registry.register(receiver).await;
    registry.join_room("dm", sender_sub).await;
    registry.join_room("dm", receiver_sub).await;

    let event = send_event(SendMessagePayload {
        ack_id: "a-4".to_string(),
        sender_id: sender,
        receiver_id: Some(receiver),
        group_id: None,
        message: "hello?".to_string(),
        room_id: "dm".to_string(),
    });
    handle_event(event, sender, sender_sub, registry.clone(), store.clone()).await;

    let sender_events = drain(&mut sender_rx);
    assert_eq!(sender_events.len(), 1);
    assert_eq!(sender_events[0]["type"], "ack");
    assert_eq!(sender_events[0]["status"], "error");
    assert_eq!(sender_events[0]["error"], "failed to save message");

    assert!(drain(&mut receiver_rx).is_empty());
}

#[tokio::test]
async fn rest_send_to_unknown_receiver_is_not_found() {
    let store = InMemoryChatStore::default();
    let sender = store.add_user("ada");
    let caller = AuthenticatedUser {
        id: sender,
        role: "student".to_string(),
    };

    let result = submit_message(
        &store,
        &caller,
        CreateMessageRequest {
            sender_id: sender,
            receiver_id: Some(Uuid::new_v4()),
            group_id: None,
            message: "anyone there?".to_string(),
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(store.stored().is_empty());
}

#[tokio::test]
async fn rest_send_marks_direct_messages_received() {
    let store = InMemoryChatStore::default();
    let sender = store.add_user("ada");
    let receiver = store.add_user("grace");
    let caller = AuthenticatedUser {
        id: sender,
        role: "student".to_string(),
    };

    let view = submit_message(
        &store,
        &caller,
        CreateMessageRequest {
            sender_id: sender,
            receiver_id: Some(receiver),
            group_id: None,
            message: "notes attached".to_string(),
        },
    )
    .await
    .unwrap();

    assert!(view.received);
    assert_eq!(view.receiver.as_ref().unwrap().id, receiver);
}

#[tokio::test]
async fn rest_send_rejects_a_spoofed_sender() {
    let store = InMemoryChatStore::default();
    let sender = store.add_user("ada");
    let receiver = store.add_user("grace");
    let caller = AuthenticatedUser {
        id: Uuid::new_v4(),
        role: "student".to_string(),
    };

    let result = submit_message(
        &store,
        &caller,
        CreateMessageRequest {
            sender_id: sender,
            receiver_id: Some(receiver),
            group_id: None,
            message: "hi".to_string(),
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}
