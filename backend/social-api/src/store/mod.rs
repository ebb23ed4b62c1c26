//! Persistence seams for messages, chats and users.
//!
//! Services only see these traits. `postgres` backs them with a shared
//! `PgPool`; `memory` keeps everything behind a `tokio::sync::RwLock` and is
//! what the HTTP tests run against.

pub mod memory;
pub mod postgres;

use crate::models::{
    AuthorSummary, ChatRef, ImageSlot, Message, NewMessage, NewUser, ProfileUpdate, SocialLink,
    User,
};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::{PgChatDirectory, PgMessageStore, PgUserDirectory};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write; holds the offending field
    #[error("{0} already exists")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: NewMessage) -> StoreResult<Message>;

    /// Returns false when no message has this id
    async fn delete(&self, id: i64) -> StoreResult<bool>;

    async fn find(&self, id: i64) -> StoreResult<Option<Message>>;

    /// Returns false when no message has this id
    async fn mark_read(&self, id: i64) -> StoreResult<bool>;

    /// Marks every unread message in `chat` not written by `reader` as read,
    /// all or nothing. Returns the number of messages flipped.
    async fn mark_chat_read(&self, chat: ChatRef, reader: Uuid) -> StoreResult<u64>;

    /// Messages of `chat` ordered by creation time, then id
    async fn list_for_chat(&self, chat: ChatRef) -> StoreResult<Vec<Message>>;
}

#[async_trait]
pub trait ChatDirectory: Send + Sync {
    async fn exists(&self, chat: ChatRef) -> StoreResult<bool>;

    /// Returns the id of the private chat between the two users, creating it if needed
    async fn create_private(&self, user_one: Uuid, user_two: Uuid) -> StoreResult<i64>;

    async fn create_group(&self, name: &str, created_by: Uuid, members: &[Uuid]) -> StoreResult<i64>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fails with `StoreError::Conflict` on a duplicate email or user name
    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_user_name(&self, user_name: &str) -> StoreResult<Option<User>>;

    /// Total user count plus one page ordered by creation time
    async fn list(&self, skip: i64, take: i64) -> StoreResult<(i64, Vec<User>)>;

    /// Case-insensitive substring match on user name or full name
    async fn search(&self, query: &str) -> StoreResult<Vec<User>>;

    async fn summaries(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, AuthorSummary>>;

    async fn social_links(&self, user_id: Uuid) -> StoreResult<Vec<SocialLink>>;

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> StoreResult<bool>;

    /// Writes the profile and, when `links` is given, replaces the social
    /// links in the same transaction. Returns false for an unknown user.
    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
        links: Option<&[SocialLink]>,
    ) -> StoreResult<bool>;

    /// Points the profile or cover picture at `file_name`.
    /// Returns the previous file name, or `None` for an unknown user.
    async fn replace_image(
        &self,
        user_id: Uuid,
        slot: ImageSlot,
        file_name: &str,
    ) -> StoreResult<Option<Option<String>>>;

    /// Flips `is_active` and returns the new value, `None` for an unknown user
    async fn toggle_active(&self, user_id: Uuid) -> StoreResult<Option<bool>>;
}
