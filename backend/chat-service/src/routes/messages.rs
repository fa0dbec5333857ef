use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::{MessageView, NewChatMessage};
use crate::services::ChatStore;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub message: String,
}

/// Paged direct-chat history between two users, oldest first.
#[get("/api/v1/chat/messages/{user_a}/{user_b}")]
pub async fn get_direct_messages(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let (user_a, user_b) = path.into_inner();
    let messages = state.messages.direct_history(user_a, user_b, query.page).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// Paged group history, oldest first.
#[get("/api/v1/chat/groups/{group_id}/messages")]
pub async fn get_group_messages(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let group_id = path.into_inner();
    if !state.messages.group_exists(group_id).await? {
        return Err(AppError::NotFound("Group not found".to_string()));
    }
    let messages = state.messages.group_history(group_id, query.page).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// REST fallback for sending a message; realtime clients use the socket.
/// Messages written here are marked received because delivery is pull-based.
#[post("/api/v1/chat/messages")]
pub async fn create_message(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<CreateMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let view = submit_message(&state.messages, &user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

/// Validates and persists a REST send: declared sender must be the caller,
/// exactly one target, and both receiver and group must exist.
pub async fn submit_message(
    store: &dyn ChatStore,
    user: &AuthenticatedUser,
    request: CreateMessageRequest,
) -> Result<MessageView, AppError> {
    if request.sender_id != user.id {
        return Err(AppError::Forbidden(
            "senderId does not match the authenticated user".to_string(),
        ));
    }
    if request.message.trim().is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    match (request.receiver_id, request.group_id) {
        (Some(_), None) | (None, Some(_)) => {}
        _ => {
            return Err(AppError::BadRequest(
                "exactly one of receiverId or groupId is required".to_string(),
            ));
        }
    }

    if let Some(receiver_id) = request.receiver_id {
        if !store.user_exists(receiver_id).await? {
            return Err(AppError::NotFound("Receiver not found".to_string()));
        }
    }
    if let Some(group_id) = request.group_id {
        if !store.group_exists(group_id).await? {
            return Err(AppError::NotFound("Group not found".to_string()));
        }
        if !store.is_group_member(group_id, request.sender_id).await? {
            return Err(AppError::Forbidden(
                "sender is not a member of this group".to_string(),
            ));
        }
    }

    let received = request.receiver_id.is_some();
    store
        .create(NewChatMessage {
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            group_id: request.group_id,
            content: request.message,
            received,
        })
        .await
}
