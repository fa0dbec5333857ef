use std::sync::Arc;

use actix_web::{get, http::header, web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;

use crate::middleware::verify_token;
use crate::state::AppState;
use crate::websocket::session::{ChatSession, Deliver};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// Websocket entry point. The token is checked before the HTTP upgrade,
/// so unauthenticated clients are refused with 401 instead of getting a
/// socket that is closed later.
#[get("/ws")]
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    params: web::Query<WsParams>,
) -> Result<HttpResponse, actix_web::Error> {
    let token = params.token.as_deref().or_else(|| {
        req.headers()
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    });
    let claims = match token.map(|token| verify_token(token, &state.config.jwt_secret)) {
        Some(Ok(claims)) => claims,
        _ => {
            tracing::warn!("websocket rejected: missing or invalid token");
            return Ok(HttpResponse::Unauthorized()
                .json(serde_json::json!({ "message": "not authorized" })));
        }
    };
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::Unauthorized()
                .json(serde_json::json!({ "message": "not authorized" })));
        }
    };

    let (subscriber_id, mut rx) = state.registry.register(user_id).await;
    let session = ChatSession::new(
        user_id,
        subscriber_id,
        state.registry.clone(),
        Arc::new(state.messages.clone()),
    );

    let (addr, response) = match ws::WsResponseBuilder::new(session, &req, stream).start_with_addr()
    {
        Ok(started) => started,
        Err(e) => {
            // A refused handshake must not leave the registration behind.
            state.registry.unregister(subscriber_id).await;
            return Err(e);
        }
    };

    // Pump registry deliveries into the actor. The loop ends when the
    // registry drops the sender at unregister time.
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            addr.do_send(Deliver(payload));
        }
    });

    Ok(response)
}
