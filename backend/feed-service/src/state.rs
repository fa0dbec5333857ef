use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::db::ContentRepository;
use crate::services::{FanoutEngine, FeedReader};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub content: ContentRepository,
    pub fanout: Arc<FanoutEngine>,
    pub reader: Arc<FeedReader>,
}
