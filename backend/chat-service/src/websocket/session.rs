use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, Handler, Message, StreamHandler};
use actix_web_actors::ws;
use uuid::Uuid;

use crate::services::ChatStore;
use crate::websocket::message_types::WsInboundEvent;
use crate::websocket::{handlers, ConnectionRegistry, SubscriberId};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound payload routed from the registry into this session's socket.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Deliver(pub String);

/// One authenticated websocket connection.
pub struct ChatSession {
    user_id: Uuid,
    subscriber_id: SubscriberId,
    registry: ConnectionRegistry,
    messages: Arc<dyn ChatStore>,
    last_heartbeat: Instant,
}

impl ChatSession {
    pub fn new(
        user_id: Uuid,
        subscriber_id: SubscriberId,
        registry: ConnectionRegistry,
        messages: Arc<dyn ChatStore>,
    ) -> Self {
        Self {
            user_id,
            subscriber_id,
            registry,
            messages,
            last_heartbeat: Instant::now(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |session, ctx| {
            if Instant::now().duration_since(session.last_heartbeat) > CLIENT_TIMEOUT {
                tracing::info!(user_id = %session.user_id, "websocket heartbeat timed out");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for ChatSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "websocket session started");
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "websocket session stopped");
        let registry = self.registry.clone();
        let subscriber_id = self.subscriber_id;
        actix::spawn(async move {
            registry.unregister(subscriber_id).await;
        });
    }
}

impl Handler<Deliver> for ChatSession {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChatSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(bytes)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&bytes);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<WsInboundEvent>(&text) {
                Ok(event) => {
                    let user_id = self.user_id;
                    let subscriber_id = self.subscriber_id;
                    let registry = self.registry.clone();
                    let messages = self.messages.clone();
                    actix::spawn(async move {
                        handlers::handle_event(event, user_id, subscriber_id, registry, messages)
                            .await;
                    });
                }
                Err(e) => {
                    tracing::warn!(user_id = %self.user_id, error = %e, "unparseable client event");
                }
            },
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!(user_id = %self.user_id, "binary frames are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!(user_id = %self.user_id, ?reason, "client closed connection");
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "websocket protocol error");
                ctx.stop();
            }
        }
    }
}
