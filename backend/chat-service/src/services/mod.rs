pub mod message_service;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{MessageView, NewChatMessage};

pub use message_service::{MessageService, PAGE_SIZE};

/// Persistence seam for the send paths. Handlers talk to this trait so
/// tests can drive them with an in-memory store.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create(&self, message: NewChatMessage) -> Result<MessageView, AppError>;
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, AppError>;
    async fn group_exists(&self, group_id: Uuid) -> Result<bool, AppError>;
    async fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
    async fn group_member_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, AppError>;
}
