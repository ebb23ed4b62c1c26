use crate::error::{AppError, AppResult};
use crate::middleware::guards::AuthenticatedCaller;
use crate::store::{ChatDirectory, UserDirectory};
use std::sync::Arc;
use uuid::Uuid;

pub struct ChatService {
    chats: Arc<dyn ChatDirectory>,
    users: Arc<dyn UserDirectory>,
}

impl ChatService {
    pub fn new(chats: Arc<dyn ChatDirectory>, users: Arc<dyn UserDirectory>) -> Self {
        Self { chats, users }
    }

    /// Returns the existing chat for the pair when there is one
    pub async fn create_private(&self, caller: &AuthenticatedCaller, other_user_id: Uuid) -> AppResult<i64> {
        if other_user_id == caller.user_id {
            return Err(AppError::BadRequest("cannot open a private chat with yourself".into()));
        }
        if self.users.find_by_id(other_user_id).await?.is_none() {
            return Err(AppError::UserNotFound);
        }

        let id = self.chats.create_private(caller.user_id, other_user_id).await?;
        tracing::info!(chat_id = id, user_id = %caller.user_id, other = %other_user_id, "private chat ready");
        Ok(id)
    }

    /// The caller always becomes a member
    pub async fn create_group(
        &self,
        caller: &AuthenticatedCaller,
        name: &str,
        member_ids: &[Uuid],
    ) -> AppResult<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("group name must not be empty".into()));
        }

        for member in member_ids.iter().filter(|m| **m != caller.user_id) {
            if self.users.find_by_id(*member).await?.is_none() {
                tracing::warn!(member = %member, "group member does not exist");
                return Err(AppError::UserNotFound);
            }
        }

        let id = self.chats.create_group(name, caller.user_id, member_ids).await?;
        tracing::info!(chat_id = id, user_id = %caller.user_id, members = member_ids.len(), "group chat created");
        Ok(id)
    }
}
