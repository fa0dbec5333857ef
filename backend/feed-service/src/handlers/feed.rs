use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::services::reader::DEFAULT_PAGE_SIZE;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub cursor: Option<String>,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Materialized view of the caller's feed, newest-first. Orphaned entries
/// are dropped from the body and surfaced only as a count.
#[get("/api/v1/feed")]
pub async fn get_user_feed(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    query: web::Query<FeedQueryParams>,
) -> Result<HttpResponse, AppError> {
    let response = state
        .reader
        .read(user.id, query.cursor.as_deref(), query.limit)
        .await?;

    Ok(HttpResponse::Ok().json(response))
}
