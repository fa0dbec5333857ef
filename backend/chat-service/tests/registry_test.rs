use uuid::Uuid;

use campus_chat_service::websocket::ConnectionRegistry;

#[tokio::test]
async fn room_broadcast_reaches_only_joined_connections() {
    let registry = ConnectionRegistry::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();

    let (alice_sub, mut alice_rx) = registry.register(alice).await;
    let (bob_sub, mut bob_rx) = registry.register(bob).await;
    let (_carol_sub, mut carol_rx) = registry.register(carol).await;

    registry.join_room("course:rust-101", alice_sub).await;
    registry.join_room("course:rust-101", bob_sub).await;

    registry
        .broadcast_room("course:rust-101", "hello".to_string())
        .await;

    assert_eq!(alice_rx.try_recv().unwrap(), "hello");
    assert_eq!(bob_rx.try_recv().unwrap(), "hello");
    assert!(carol_rx.try_recv().is_err());
}

#[tokio::test]
async fn room_members_drain_broadcasts_in_send_order() {
    let registry = ConnectionRegistry::new();
    let (a, mut a_rx) = registry.register(Uuid::new_v4()).await;
    let (b, mut b_rx) = registry.register(Uuid::new_v4()).await;

    registry.join_room("seminar", a).await;
    registry.join_room("seminar", b).await;

    for msg in ["first", "second", "third"] {
        registry.broadcast_room("seminar", msg.to_string()).await;
    }

    for rx in [&mut a_rx, &mut b_rx] {
        assert_eq!(rx.try_recv().unwrap(), "first");
        assert_eq!(rx.try_recv().unwrap(), "second");
        assert_eq!(rx.try_recv().unwrap(), "third");
        assert!(rx.try_recv().is_err());
    }
}

#[tokio::test]
async fn leaving_a_room_stops_delivery() {
    let registry = ConnectionRegistry::new();
    let (sub, mut rx) = registry.register(Uuid::new_v4()).await;

    registry.join_room("lounge", sub).await;
    registry.broadcast_room("lounge", "first".to_string()).await;
    registry.leave_room("lounge", sub).await;
    registry.broadcast_room("lounge", "second".to_string()).await;

    assert_eq!(rx.try_recv().unwrap(), "first");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn leaving_a_room_never_joined_is_a_no_op() {
    let registry = ConnectionRegistry::new();
    let (sub, mut rx) = registry.register(Uuid::new_v4()).await;

    registry.leave_room("nowhere", sub).await;
    registry.broadcast_room("nowhere", "noise".to_string()).await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unregister_leaves_all_rooms_and_closes_the_channel() {
    let registry = ConnectionRegistry::new();
    let user = Uuid::new_v4();
    let (sub, mut rx) = registry.register(user).await;
    let (other_sub, mut other_rx) = registry.register(Uuid::new_v4()).await;

    registry.join_room("a", sub).await;
    registry.join_room("b", sub).await;
    registry.join_room("a", other_sub).await;
    assert_eq!(registry.room_size("a").await, 2);

    registry.unregister(sub).await;

    assert_eq!(registry.room_size("a").await, 1);
    assert_eq!(registry.room_size("b").await, 0);

    registry.broadcast_room("a", "still here".to_string()).await;
    assert_eq!(other_rx.try_recv().unwrap(), "still here");

    // The dropped sender closes the receiving side.
    registry.send_to_user(user, "gone".to_string()).await;
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn send_to_user_reaches_every_connection_of_that_user() {
    let registry = ConnectionRegistry::new();
    let user = Uuid::new_v4();

    let (_phone, mut phone_rx) = registry.register(user).await;
    let (_laptop, mut laptop_rx) = registry.register(user).await;
    let (_other, mut other_rx) = registry.register(Uuid::new_v4()).await;

    registry.send_to_user(user, "ping".to_string()).await;

    assert_eq!(phone_rx.try_recv().unwrap(), "ping");
    assert_eq!(laptop_rx.try_recv().unwrap(), "ping");
    assert!(other_rx.try_recv().is_err());
}

#[tokio::test]
async fn send_to_subscriber_targets_one_connection_only() {
    let registry = ConnectionRegistry::new();
    let user = Uuid::new_v4();

    let (phone, mut phone_rx) = registry.register(user).await;
    let (_laptop, mut laptop_rx) = registry.register(user).await;

    registry.send_to_subscriber(phone, "ack".to_string()).await;

    assert_eq!(phone_rx.try_recv().unwrap(), "ack");
    assert!(laptop_rx.try_recv().is_err());
}

#[tokio::test]
async fn broadcast_all_reaches_every_live_connection() {
    let registry = ConnectionRegistry::new();
    let (_a, mut a_rx) = registry.register(Uuid::new_v4()).await;
    let (b, mut b_rx) = registry.register(Uuid::new_v4()).await;

    registry.unregister(b).await;
    registry.broadcast_all("announcement".to_string()).await;

    assert_eq!(a_rx.try_recv().unwrap(), "announcement");
    assert!(b_rx.recv().await.is_none());
}
