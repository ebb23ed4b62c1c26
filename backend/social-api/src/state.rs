use crate::{
    config::ServiceSettings,
    services::{ChatService, MessageService, UserService},
    store::{
        ChatDirectory, MemoryStore, MessageStore, PgChatDirectory, PgMessageStore,
        PgUserDirectory, UserDirectory,
    },
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub messages: Arc<MessageService>,
    pub users: Arc<UserService>,
    pub chats: Arc<ChatService>,
    /// Used by the caller extractor to resolve token claims
    pub user_directory: Arc<dyn UserDirectory>,
}

impl AppState {
    pub fn new(
        message_store: Arc<dyn MessageStore>,
        chat_directory: Arc<dyn ChatDirectory>,
        user_directory: Arc<dyn UserDirectory>,
        settings: &ServiceSettings,
    ) -> Self {
        Self {
            messages: Arc::new(MessageService::new(
                message_store,
                chat_directory.clone(),
                user_directory.clone(),
                settings,
            )),
            users: Arc::new(UserService::new(user_directory.clone(), settings)),
            chats: Arc::new(ChatService::new(chat_directory, user_directory.clone())),
            user_directory,
        }
    }

    pub fn postgres(pool: PgPool, settings: &ServiceSettings) -> Self {
        Self::new(
            Arc::new(PgMessageStore::new(pool.clone())),
            Arc::new(PgChatDirectory::new(pool.clone())),
            Arc::new(PgUserDirectory::new(pool)),
            settings,
        )
    }

    pub fn in_memory(store: MemoryStore, settings: &ServiceSettings) -> Self {
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            settings,
        )
    }
}
