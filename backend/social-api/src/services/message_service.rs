//! Message creation, deletion, read tracking and per-chat listing.

use crate::config::{DeletePolicy, ServiceSettings};
use crate::error::{AppError, AppResult};
use crate::middleware::authorization::authorize_delete;
use crate::middleware::guards::AuthenticatedCaller;
use crate::models::{normalize_image_path, ChatRef, Message, MessageView, NewMessage};
use crate::store::{ChatDirectory, MessageStore, UserDirectory};
use std::sync::Arc;
use uuid::Uuid;

/// Fields of a create request after deserialization
#[derive(Debug, Clone)]
pub struct CreateMessageInput {
    pub user_id: Uuid,
    pub text: String,
    pub private_chat_id: Option<i64>,
    pub group_chat_id: Option<i64>,
    pub is_read: bool,
}

pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    chats: Arc<dyn ChatDirectory>,
    users: Arc<dyn UserDirectory>,
    avatar_base_path: String,
    delete_policy: DeletePolicy,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        chats: Arc<dyn ChatDirectory>,
        users: Arc<dyn UserDirectory>,
        settings: &ServiceSettings,
    ) -> Self {
        Self {
            messages,
            chats,
            users,
            avatar_base_path: settings.avatar_base_path.clone(),
            delete_policy: settings.delete_policy,
        }
    }

    pub async fn create_message(
        &self,
        caller: &AuthenticatedCaller,
        input: CreateMessageInput,
    ) -> AppResult<Message> {
        if input.text.is_empty() {
            return Err(AppError::BadRequest("text must not be empty".into()));
        }
        let chat = ChatRef::from_ids(input.private_chat_id, input.group_chat_id)?;

        if input.user_id != caller.user_id {
            tracing::warn!(
                caller = %caller.user_id,
                claimed_author = %input.user_id,
                "message author does not match caller"
            );
            return Err(AppError::Forbidden("user_id must be the caller".into()));
        }

        if !self.chats.exists(chat).await? {
            return Err(AppError::ChatNotFound);
        }

        let message = self
            .messages
            .insert(NewMessage {
                author_id: caller.user_id,
                text: input.text,
                chat,
                is_read: input.is_read,
            })
            .await?;

        tracing::info!(message_id = message.id, user_id = %caller.user_id, %chat, "message created");
        Ok(message)
    }

    pub async fn delete_message(&self, caller: &AuthenticatedCaller, message_id: i64) -> AppResult<()> {
        let message = self
            .messages
            .find(message_id)
            .await?
            .ok_or(AppError::MessageNotFound)?;

        authorize_delete(self.delete_policy, caller, message.user_id)?;

        // Raced with another delete
        if !self.messages.delete(message_id).await? {
            return Err(AppError::MessageNotFound);
        }

        tracing::info!(message_id, user_id = %caller.user_id, chat = %message.chat, "message deleted");
        Ok(())
    }

    /// Idempotent: marking an already read message succeeds
    pub async fn mark_read(&self, caller: &AuthenticatedCaller, message_id: i64) -> AppResult<()> {
        if !self.messages.mark_read(message_id).await? {
            return Err(AppError::MessageNotFound);
        }
        tracing::info!(message_id, user_id = %caller.user_id, "message marked read");
        Ok(())
    }

    /// Marks every message in the chat written by someone other than `reader_id`.
    /// Returns how many messages changed state.
    pub async fn mark_chat_read(
        &self,
        reader_id: Uuid,
        private_chat_id: Option<i64>,
        group_chat_id: Option<i64>,
    ) -> AppResult<u64> {
        let chat = ChatRef::from_ids(private_chat_id, group_chat_id)?;

        if self.users.find_by_id(reader_id).await?.is_none() {
            return Err(AppError::UserNotFound);
        }

        let updated = self.messages.mark_chat_read(chat, reader_id).await?;
        tracing::info!(user_id = %reader_id, %chat, updated, "chat marked read");
        Ok(updated)
    }

    /// Messages of a chat, oldest first, with their authors resolved.
    /// No chat means an empty listing.
    pub async fn get_messages(&self, chat: Option<ChatRef>) -> AppResult<Vec<MessageView>> {
        let Some(chat) = chat else {
            return Ok(Vec::new());
        };

        if !self.chats.exists(chat).await? {
            return Err(AppError::ChatNotFound);
        }

        let messages = self.messages.list_for_chat(chat).await?;

        let mut author_ids: Vec<Uuid> = messages.iter().map(|m| m.user_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors = self.users.summaries(&author_ids).await?;

        Ok(messages
            .into_iter()
            .map(|message| {
                let author = authors.get(&message.user_id).cloned().map(|mut author| {
                    author.image_url =
                        normalize_image_path(author.image_url.take(), &self.avatar_base_path);
                    author
                });
                MessageView::new(message, author)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, Role, User};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    struct Fixture {
        store: MemoryStore,
        service: MessageService,
    }

    fn fixture(policy: DeletePolicy) -> Fixture {
        let store = MemoryStore::new();
        let settings = ServiceSettings {
            delete_policy: policy,
            ..ServiceSettings::default()
        };
        let service = MessageService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            &settings,
        );
        Fixture { store, service }
    }

    async fn user(store: &MemoryStore, name: &str, role: Role) -> User {
        UserDirectory::insert(
            store,
            NewUser {
                email: format!("{name}@example.com"),
                user_name: name.into(),
                full_name: name.to_uppercase(),
                password_hash: "hash".into(),
                birth_date: NaiveDate::from_ymd_opt(1995, 5, 5).unwrap(),
                role,
            },
        )
        .await
        .unwrap()
    }

    fn caller_of(user: &User) -> AuthenticatedCaller {
        AuthenticatedCaller {
            user_id: user.id,
            email: user.email.clone(),
            roles: vec![user.role],
        }
    }

    fn input(user: &User, text: &str, chat: ChatRef) -> CreateMessageInput {
        CreateMessageInput {
            user_id: user.id,
            text: text.into(),
            private_chat_id: chat.private_chat_id(),
            group_chat_id: chat.group_chat_id(),
            is_read: false,
        }
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let f = fixture(DeletePolicy::Any);
        let alice = user(&f.store, "alice", Role::Member).await;
        let err = f
            .service
            .create_message(&caller_of(&alice), input(&alice, "", ChatRef::Private(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_author_must_be_caller() {
        let f = fixture(DeletePolicy::Any);
        let alice = user(&f.store, "alice", Role::Member).await;
        let bob = user(&f.store, "bob", Role::Member).await;
        let chat = f.store.create_private(alice.id, bob.id).await.unwrap();

        let err = f
            .service
            .create_message(&caller_of(&alice), input(&bob, "hi", ChatRef::Private(chat)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_unknown_chat_is_not_found() {
        let f = fixture(DeletePolicy::Any);
        let alice = user(&f.store, "alice", Role::Member).await;
        let err = f
            .service
            .create_message(&caller_of(&alice), input(&alice, "hi", ChatRef::Group(99)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ChatNotFound));
    }

    #[tokio::test]
    async fn test_get_messages_in_creation_order_with_authors() {
        let f = fixture(DeletePolicy::Any);
        let mut alice = user(&f.store, "alice", Role::Member).await;
        alice.image_url = Some("alice.png".into());
        f.store.put_user(alice.clone()).await;
        let bob = user(&f.store, "bob", Role::Member).await;
        let chat = ChatRef::Private(f.store.create_private(alice.id, bob.id).await.unwrap());

        for (who, text) in [(&alice, "one"), (&bob, "two"), (&alice, "three")] {
            f.service
                .create_message(&caller_of(who), input(who, text, chat))
                .await
                .unwrap();
        }

        let views = f.service.get_messages(Some(chat)).await.unwrap();
        let texts: Vec<&str> = views.iter().map(|v| v.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);

        let author = views[0].user.as_ref().unwrap();
        assert_eq!(author.user_name, "alice");
        assert_eq!(author.image_url.as_deref(), Some("Resources/Images/alice.png"));
        assert!(views[1].user.as_ref().unwrap().image_url.is_none());
    }

    #[tokio::test]
    async fn test_get_messages_without_chat_is_empty() {
        let f = fixture(DeletePolicy::Any);
        assert!(f.service.get_messages(None).await.unwrap().is_empty());
        assert!(matches!(
            f.service.get_messages(Some(ChatRef::Private(3))).await,
            Err(AppError::ChatNotFound)
        ));
    }

    #[tokio::test]
    async fn test_mark_read_unknown_and_twice() {
        let f = fixture(DeletePolicy::Any);
        let alice = user(&f.store, "alice", Role::Member).await;
        let caller = caller_of(&alice);
        let chat = ChatRef::Group(f.store.create_group("g", alice.id, &[]).await.unwrap());

        assert!(matches!(
            f.service.mark_read(&caller, 404).await,
            Err(AppError::MessageNotFound)
        ));

        let message = f
            .service
            .create_message(&caller, input(&alice, "hi", chat))
            .await
            .unwrap();
        f.service.mark_read(&caller, message.id).await.unwrap();
        f.service.mark_read(&caller, message.id).await.unwrap();
        assert!(f.store.find(message.id).await.unwrap().unwrap().is_read);
    }

    #[tokio::test]
    async fn test_mark_chat_read_requires_known_user() {
        let f = fixture(DeletePolicy::Any);
        assert!(matches!(
            f.service.mark_chat_read(Uuid::new_v4(), Some(1), None).await,
            Err(AppError::UserNotFound)
        ));
        assert!(matches!(
            f.service.mark_chat_read(Uuid::new_v4(), Some(1), Some(2)).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_author_or_admin_delete_policy() {
        let f = fixture(DeletePolicy::AuthorOrAdmin);
        let alice = user(&f.store, "alice", Role::Member).await;
        let bob = user(&f.store, "bob", Role::Member).await;
        let admin = user(&f.store, "root", Role::Admin).await;
        let chat = ChatRef::Private(f.store.create_private(alice.id, bob.id).await.unwrap());

        let first = f
            .service
            .create_message(&caller_of(&alice), input(&alice, "a", chat))
            .await
            .unwrap();
        let second = f
            .service
            .create_message(&caller_of(&alice), input(&alice, "b", chat))
            .await
            .unwrap();

        assert!(matches!(
            f.service.delete_message(&caller_of(&bob), first.id).await,
            Err(AppError::Forbidden(_))
        ));
        f.service.delete_message(&caller_of(&alice), first.id).await.unwrap();
        f.service.delete_message(&caller_of(&admin), second.id).await.unwrap();
        assert!(f.service.get_messages(Some(chat)).await.unwrap().is_empty());
    }
}
