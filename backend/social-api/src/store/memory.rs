use super::{ChatDirectory, MessageStore, StoreError, StoreResult, UserDirectory};
use crate::models::{
    AuthorSummary, ChatRef, GroupChat, ImageSlot, Message, NewMessage, NewUser, PrivateChat,
    ProfileUpdate, SocialLink, User,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    next_message_id: i64,
    next_chat_id: i64,
    messages: BTreeMap<i64, Message>,
    private_chats: HashMap<i64, PrivateChat>,
    group_chats: HashMap<i64, GroupChat>,
    users: HashMap<Uuid, User>,
    social_links: HashMap<Uuid, Vec<SocialLink>>,
}

impl State {
    fn allocate_message_id(&mut self) -> i64 {
        self.next_message_id += 1;
        self.next_message_id
    }

    fn allocate_chat_id(&mut self) -> i64 {
        self.next_chat_id += 1;
        self.next_chat_id
    }
}

/// In-process store implementing every store trait over one shared state.
///
/// Writers take the lock exclusively, so each operation is all or nothing.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a stored user wholesale
    pub async fn put_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, message: NewMessage) -> StoreResult<Message> {
        let mut state = self.state.write().await;
        let id = state.allocate_message_id();
        let stored = Message {
            id,
            text: message.text,
            created_at: Utc::now(),
            is_read: message.is_read,
            user_id: message.author_id,
            chat: message.chat,
        };
        state.messages.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.state.write().await.messages.remove(&id).is_some())
    }

    async fn find(&self, id: i64) -> StoreResult<Option<Message>> {
        Ok(self.state.read().await.messages.get(&id).cloned())
    }

    async fn mark_read(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.messages.get_mut(&id) {
            Some(message) => {
                message.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_chat_read(&self, chat: ChatRef, reader: Uuid) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for message in state.messages.values_mut() {
            if message.chat == chat && message.user_id != reader && !message.is_read {
                message.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn list_for_chat(&self, chat: ChatRef) -> StoreResult<Vec<Message>> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .values()
            .filter(|m| m.chat == chat)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }
}

#[async_trait]
impl ChatDirectory for MemoryStore {
    async fn exists(&self, chat: ChatRef) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(match chat {
            ChatRef::Private(id) => state.private_chats.contains_key(&id),
            ChatRef::Group(id) => state.group_chats.contains_key(&id),
        })
    }

    async fn create_private(&self, user_one: Uuid, user_two: Uuid) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        let existing = state
            .private_chats
            .values()
            .filter(|c| c.has_member(user_one) && c.has_member(user_two))
            .map(|c| c.id)
            .min();
        if let Some(id) = existing {
            return Ok(id);
        }

        let id = state.allocate_chat_id();
        state.private_chats.insert(
            id,
            PrivateChat {
                id,
                user_one_id: user_one,
                user_two_id: user_two,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn create_group(&self, name: &str, created_by: Uuid, members: &[Uuid]) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        let id = state.allocate_chat_id();

        let mut member_ids = vec![created_by];
        for member in members {
            if !member_ids.contains(member) {
                member_ids.push(*member);
            }
        }

        state.group_chats.insert(
            id,
            GroupChat {
                id,
                name: name.to_string(),
                created_by,
                member_ids,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Conflict("email".into()));
        }
        if state
            .users
            .values()
            .any(|u| u.user_name.eq_ignore_ascii_case(&user.user_name))
        {
            return Err(StoreError::Conflict("user_name".into()));
        }

        let stored = User {
            id: Uuid::new_v4(),
            email: user.email,
            user_name: user.user_name,
            full_name: user.full_name,
            password_hash: user.password_hash,
            birth_date: user.birth_date,
            role: user.role,
            is_active: true,
            image_url: None,
            cover_pic_url: None,
            relationship_status: None,
            occupation: None,
            education: None,
            status: None,
            country: None,
            phone_number: None,
            created_at: Utc::now(),
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.user_name.eq_ignore_ascii_case(user_name))
            .cloned())
    }

    async fn list(&self, skip: i64, take: i64) -> StoreResult<(i64, Vec<User>)> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let count = users.len() as i64;
        let page = users
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(take.max(0) as usize)
            .collect();
        Ok((count, page))
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<User>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| {
                u.user_name.to_lowercase().contains(&needle)
                    || u.full_name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.user_name.cmp(&b.user_name));
        Ok(users)
    }

    async fn summaries(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, AuthorSummary>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .map(|u| {
                (
                    u.id,
                    AuthorSummary {
                        id: u.id,
                        user_name: u.user_name.clone(),
                        full_name: u.full_name.clone(),
                        image_url: u.image_url.clone(),
                    },
                )
            })
            .collect())
    }

    async fn social_links(&self, user_id: Uuid) -> StoreResult<Vec<SocialLink>> {
        Ok(self
            .state
            .read()
            .await
            .social_links
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
        links: Option<&[SocialLink]>,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(false);
        };

        user.full_name = update.full_name.clone();
        if let Some(birth_date) = update.birth_date {
            user.birth_date = birth_date;
        }
        user.relationship_status = update.relationship_status.clone();
        user.occupation = update.occupation.clone();
        user.education = update.education.clone();
        user.status = update.status.clone();
        user.country = update.country.clone();
        user.phone_number = update.phone_number.clone();

        if let Some(links) = links {
            state.social_links.insert(user_id, links.to_vec());
        }
        Ok(true)
    }

    async fn replace_image(
        &self,
        user_id: Uuid,
        slot: ImageSlot,
        file_name: &str,
    ) -> StoreResult<Option<Option<String>>> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&user_id).map(|user| {
            let current = match slot {
                ImageSlot::Profile => &mut user.image_url,
                ImageSlot::Cover => &mut user.cover_pic_url,
            };
            current.replace(file_name.to_string())
        }))
    }

    async fn toggle_active(&self, user_id: Uuid) -> StoreResult<Option<bool>> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&user_id).map(|user| {
            user.is_active = !user.is_active;
            user.is_active
        }))
    }
}
