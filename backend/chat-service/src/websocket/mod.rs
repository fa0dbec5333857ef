use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

pub mod handlers;
pub mod message_types;
pub mod session;

/// Unique identifier for a websocket subscriber.
///
/// Each connection gets its own id at registration so a user can hold
/// several simultaneous connections and each can be cleaned up precisely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscriber {
    user_id: Uuid,
    sender: UnboundedSender<String>,
}

#[derive(Default)]
struct RegistryInner {
    subscribers: HashMap<SubscriberId, Subscriber>,
    // room name -> connections currently joined
    rooms: HashMap<String, HashSet<SubscriberId>>,
    // user -> all of that user's live connections
    by_user: HashMap<Uuid, HashSet<SubscriberId>>,
}

impl RegistryInner {
    /// Drop one connection from every index. Returns the owning user when
    /// the subscriber was still registered.
    fn remove(&mut self, subscriber_id: SubscriberId) -> Option<Uuid> {
        let subscriber = self.subscribers.remove(&subscriber_id)?;

        for members in self.rooms.values_mut() {
            members.remove(&subscriber_id);
        }
        self.rooms.retain(|_, members| !members.is_empty());

        if let Some(connections) = self.by_user.get_mut(&subscriber.user_id) {
            connections.remove(&subscriber_id);
            if connections.is_empty() {
                self.by_user.remove(&subscriber.user_id);
            }
        }

        Some(subscriber.user_id)
    }
}

/// Connection registry for websocket sessions.
///
/// Tracks which connections exist, which rooms each has joined, and which
/// connections belong to which user. Room membership here is transport
/// subscription only; durable group membership lives in the database.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection for `user_id`.
    ///
    /// Returns the subscriber id (used for joins and cleanup) and the
    /// receiving end of the connection's outbound channel.
    pub async fn register(&self, user_id: Uuid) -> (SubscriberId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let subscriber_id = SubscriberId::new();

        let mut guard = self.inner.write().await;
        guard.subscribers.insert(
            subscriber_id,
            Subscriber {
                user_id,
                sender: tx,
            },
        );
        guard.by_user.entry(user_id).or_default().insert(subscriber_id);

        tracing::debug!(
            ?subscriber_id,
            %user_id,
            total = guard.subscribers.len(),
            "registered websocket connection"
        );

        (subscriber_id, rx)
    }

    /// Drop a connection and implicitly leave every room it had joined.
    /// Must be called when the websocket closes to avoid leaks.
    pub async fn unregister(&self, subscriber_id: SubscriberId) {
        let mut guard = self.inner.write().await;

        if let Some(user_id) = guard.remove(subscriber_id) {
            tracing::debug!(
                ?subscriber_id,
                %user_id,
                remaining = guard.subscribers.len(),
                "unregistered websocket connection"
            );
        }
    }

    /// Join a room. Unknown connections are ignored.
    pub async fn join_room(&self, room: &str, subscriber_id: SubscriberId) {
        let mut guard = self.inner.write().await;
        if !guard.subscribers.contains_key(&subscriber_id) {
            return;
        }
        guard
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(subscriber_id);

        tracing::debug!(
            ?subscriber_id,
            room,
            members = guard.rooms.get(room).map(|m| m.len()).unwrap_or(0),
            "joined room"
        );
    }

    /// Leave a room. Leaving a room never joined is a no-op.
    pub async fn leave_room(&self, room: &str, subscriber_id: SubscriberId) {
        let mut guard = self.inner.write().await;
        if let Some(members) = guard.rooms.get_mut(room) {
            members.remove(&subscriber_id);
            if members.is_empty() {
                guard.rooms.remove(room);
            }
        }
    }

    /// Send to every connection joined to `room`, dropping dead senders.
    pub async fn broadcast_room(&self, room: &str, msg: String) {
        let mut guard = self.inner.write().await;
        let Some(members) = guard.rooms.get(room) else {
            return;
        };

        let mut dead = Vec::new();
        for subscriber_id in members.iter().copied().collect::<Vec<_>>() {
            match guard.subscribers.get(&subscriber_id) {
                Some(subscriber) if subscriber.sender.send(msg.clone()).is_ok() => {}
                _ => dead.push(subscriber_id),
            }
        }

        if !dead.is_empty() {
            tracing::debug!(room, dead = dead.len(), "cleaned up dead room members");
            for subscriber_id in dead {
                guard.remove(subscriber_id);
            }
        }
    }

    /// Send to every live connection of one user, dropping dead senders.
    pub async fn send_to_user(&self, user_id: Uuid, msg: String) {
        let mut guard = self.inner.write().await;
        let Some(connections) = guard.by_user.get(&user_id) else {
            return;
        };

        let mut dead = Vec::new();
        for subscriber_id in connections.iter().copied().collect::<Vec<_>>() {
            match guard.subscribers.get(&subscriber_id) {
                Some(subscriber) if subscriber.sender.send(msg.clone()).is_ok() => {}
                _ => dead.push(subscriber_id),
            }
        }

        for subscriber_id in dead {
            guard.remove(subscriber_id);
        }
    }

    /// Send to one specific connection (acks go here, not to the user's
    /// other devices).
    pub async fn send_to_subscriber(&self, subscriber_id: SubscriberId, msg: String) {
        let guard = self.inner.read().await;
        if let Some(subscriber) = guard.subscribers.get(&subscriber_id) {
            let _ = subscriber.sender.send(msg);
        }
    }

    /// Send to every connected client, dropping dead senders.
    pub async fn broadcast_all(&self, msg: String) {
        let mut guard = self.inner.write().await;

        let mut dead = Vec::new();
        for subscriber_id in guard.subscribers.keys().copied().collect::<Vec<_>>() {
            match guard.subscribers.get(&subscriber_id) {
                Some(subscriber) if subscriber.sender.send(msg.clone()).is_ok() => {}
                _ => dead.push(subscriber_id),
            }
        }

        for subscriber_id in dead {
            guard.remove(subscriber_id);
        }
    }

    /// Room member count, for diagnostics.
    pub async fn room_size(&self, room: &str) -> usize {
        let guard = self.inner.read().await;
        guard.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    /// Live connection count, for diagnostics.
    pub async fn connection_count(&self) -> usize {
        let guard = self.inner.read().await;
        guard.subscribers.len()
    }
}
