use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::services::ContentStore;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: String,
    pub forum_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    pub content: Option<String>,
}

#[post("/api/v1/posts")]
pub async fn create_post(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    if body.content.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Content and forumId are required".to_string(),
        ));
    }
    if !state.content.forum_exists(body.forum_id).await? {
        return Err(AppError::NotFound("Forum not found".to_string()));
    }

    let post = state
        .content
        .create_post(user.id, body.forum_id, &body.content)
        .await?;

    // Fan-out runs after the successful save; its failures never undo the
    // post, the author just gets partial distribution.
    match state.fanout.fan_out_post(user.id, post.id).await {
        Ok(report) => debug!(
            post_id = %post.id,
            recipients = report.recipients,
            delivered = report.delivered,
            "post fanned out"
        ),
        Err(e) => error!(post_id = %post.id, error = %e, "post fan-out failed"),
    }

    Ok(HttpResponse::Created().json(post))
}

#[get("/api/v1/posts/{id}")]
pub async fn get_post(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let post = state
        .content
        .post_view(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    Ok(HttpResponse::Ok().json(post))
}

#[get("/api/v1/forums/{forum_id}/posts")]
pub async fn get_posts_by_forum(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let posts = state.content.posts_by_forum(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

#[patch("/api/v1/posts/{id}")]
pub async fn update_post(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateContentRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let post = state
        .content
        .post_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if !user.is_admin() && post.user_id != user.id {
        return Err(AppError::Forbidden(
            "You are not authorized to update this post".to_string(),
        ));
    }

    let updated = match body.into_inner().content.filter(|c| !c.is_empty()) {
        Some(content) => state
            .content
            .update_post_content(id, &content)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?,
        None => post,
    };

    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/api/v1/posts/{id}")]
pub async fn delete_post(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let post = state
        .content
        .post_record(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if !user.is_admin() && post.user_id != user.id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this post".to_string(),
        ));
    }

    // Replies and feed entries pointing here are left in place; the feed
    // reader drops them as orphans on read.
    state.content.delete_post(id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Post removed" })))
}
