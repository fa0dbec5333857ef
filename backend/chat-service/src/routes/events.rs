use actix_web::{post, web, HttpResponse};

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;
use crate::websocket::message_types::WsOutboundEvent;

/// Admin hook: fan a pollExpired notice out to every connected client.
/// Poll lifecycle itself lives in another service; this is broadcast only.
#[post("/api/v1/chat/events/poll-expired")]
pub async fn poll_expired(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "only admins may broadcast events".to_string(),
        ));
    }

    let event = WsOutboundEvent::PollExpired {
        payload: body.into_inner(),
    };
    let payload = serde_json::to_string(&event).map_err(|_| AppError::Internal)?;
    state.registry.broadcast_all(payload).await;

    Ok(HttpResponse::Accepted().json(serde_json::json!({ "message": "event broadcast" })))
}
