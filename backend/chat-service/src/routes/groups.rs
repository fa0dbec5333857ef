use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub group_name: String,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

/// Create a chat group. The caller becomes a member automatically.
/// Clients announce the new group to peers with a groupCreated socket event.
#[post("/api/v1/chat/groups")]
pub async fn create_group(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<CreateGroupRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();

    if request.group_name.trim().is_empty() || request.members.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide groupName and members".to_string(),
        ));
    }

    let group = state
        .messages
        .create_group(request.group_name.trim(), &request.members, user.id)
        .await?;

    Ok(HttpResponse::Created().json(group))
}
