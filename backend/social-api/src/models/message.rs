use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// The chat a message belongs to. A message always has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatRef {
    Private(i64),
    Group(i64),
}

impl ChatRef {
    /// Build a reference from the nullable id pair used on the wire.
    /// Exactly one id must be present.
    pub fn from_ids(private_chat_id: Option<i64>, group_chat_id: Option<i64>) -> Result<Self, AppError> {
        match (private_chat_id, group_chat_id) {
            (Some(id), None) => Ok(ChatRef::Private(id)),
            (None, Some(id)) => Ok(ChatRef::Group(id)),
            (None, None) => Err(AppError::BadRequest(
                "either private_chat_id or group_chat_id is required".into(),
            )),
            (Some(_), Some(_)) => Err(AppError::BadRequest(
                "private_chat_id and group_chat_id are mutually exclusive".into(),
            )),
        }
    }

    pub fn private_chat_id(&self) -> Option<i64> {
        match self {
            ChatRef::Private(id) => Some(*id),
            ChatRef::Group(_) => None,
        }
    }

    pub fn group_chat_id(&self) -> Option<i64> {
        match self {
            ChatRef::Group(id) => Some(*id),
            ChatRef::Private(_) => None,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ChatRef::Private(id) | ChatRef::Group(id) => *id,
        }
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Private(id) => write!(f, "private:{id}"),
            ChatRef::Group(id) => write!(f, "group:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub user_id: Uuid,
    pub chat: ChatRef,
}

/// Validated input for a message insert
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub author_id: Uuid,
    pub text: String,
    pub chat: ChatRef,
    pub is_read: bool,
}

/// Author metadata attached to every listed message
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub user_name: String,
    pub full_name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageView {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub user_id: Uuid,
    pub private_chat_id: Option<i64>,
    pub group_chat_id: Option<i64>,
    pub user: Option<AuthorSummary>,
}

impl MessageView {
    pub fn new(message: Message, user: Option<AuthorSummary>) -> Self {
        Self {
            id: message.id,
            private_chat_id: message.chat.private_chat_id(),
            group_chat_id: message.chat.group_chat_id(),
            text: message.text,
            created_at: message.created_at,
            is_read: message.is_read,
            user_id: message.user_id,
            user,
        }
    }
}
