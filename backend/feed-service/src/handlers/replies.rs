use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

use super::posts::UpdateContentRequest;
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    pub content: String,
    pub post_id: Uuid,
}

#[post("/api/v1/replies")]
pub async fn create_reply(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<CreateReplyRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    if body.content.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Content and postId are required".to_string(),
        ));
    }

    let post = state
        .content
        .post_record(body.post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let reply = state
        .content
        .create_reply(user.id, body.post_id, &body.content)
        .await?;

    // The parent post's author always gets the reply in their feed, even if
    // they neither follow nor befriend the reply author.
    match state
        .fanout
        .fan_out_reply(user.id, reply.id, post.user_id)
        .await
    {
        Ok(report) => debug!(
            reply_id = %reply.id,
            recipients = report.recipients,
            delivered = report.delivered,
            "reply fanned out"
        ),
        Err(e) => error!(reply_id = %reply.id, error = %e, "reply fan-out failed"),
    }

    Ok(HttpResponse::Created().json(reply))
}

#[get("/api/v1/posts/{post_id}/replies")]
pub async fn get_replies_by_post(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let replies = state.content.replies_by_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(replies))
}

#[patch("/api/v1/replies/{id}")]
pub async fn update_reply(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateContentRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let reply = state
        .content
        .reply_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Reply not found".to_string()))?;

    if !user.is_admin() && reply.user_id != user.id {
        return Err(AppError::Forbidden(
            "You are not authorized to update this reply".to_string(),
        ));
    }

    let updated = match body.into_inner().content.filter(|c| !c.is_empty()) {
        Some(content) => state
            .content
            .update_reply_content(id, &content)
            .await?
            .ok_or_else(|| AppError::NotFound("Reply not found".to_string()))?,
        None => reply,
    };

    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/api/v1/replies/{id}")]
pub async fn delete_reply(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let reply = state
        .content
        .reply_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Reply not found".to_string()))?;

    if !user.is_admin() && reply.user_id != user.id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this reply".to_string(),
        ));
    }

    state.content.delete_reply(id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Reply removed" })))
}
