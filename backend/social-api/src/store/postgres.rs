use super::{ChatDirectory, MessageStore, StoreError, StoreResult, UserDirectory};
use crate::models::{
    AuthorSummary, ChatRef, ImageSlot, Message, NewMessage, NewUser, ProfileUpdate, Role,
    SocialLink, User,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

const MESSAGE_COLUMNS: &str =
    "id, text, created_at, is_read, user_id, private_chat_id, group_chat_id";

const USER_COLUMNS: &str = "id, email, user_name, full_name, password_hash, birth_date, role, \
     is_active, image_url, cover_pic_url, relationship_status, occupation, education, status, \
     country, phone_number, created_at";

#[derive(Debug, FromRow)]
struct MessageRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    is_read: bool,
    user_id: Uuid,
    private_chat_id: Option<i64>,
    group_chat_id: Option<i64>,
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let chat = match (row.private_chat_id, row.group_chat_id) {
            (Some(id), None) => ChatRef::Private(id),
            (None, Some(id)) => ChatRef::Group(id),
            _ => {
                return Err(StoreError::Corrupt(format!(
                    "message {} does not reference exactly one chat",
                    row.id
                )))
            }
        };

        Ok(Message {
            id: row.id,
            text: row.text,
            created_at: row.created_at,
            is_read: row.is_read,
            user_id: row.user_id,
            chat,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    user_name: String,
    full_name: String,
    password_hash: String,
    birth_date: NaiveDate,
    role: String,
    is_active: bool,
    image_url: Option<String>,
    cover_pic_url: Option<String>,
    relationship_status: Option<String>,
    occupation: Option<String>,
    education: Option<String>,
    status: Option<String>,
    country: Option<String>,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_db(&row.role)
            .ok_or_else(|| StoreError::Corrupt(format!("user {} has role {}", row.id, row.role)))?;

        Ok(User {
            id: row.id,
            email: row.email,
            user_name: row.user_name,
            full_name: row.full_name,
            password_hash: row.password_hash,
            birth_date: row.birth_date,
            role,
            is_active: row.is_active,
            image_url: row.image_url,
            cover_pic_url: row.cover_pic_url,
            relationship_status: row.relationship_status,
            occupation: row.occupation,
            education: row.education,
            status: row.status,
            country: row.country,
            phone_number: row.phone_number,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: Uuid,
    user_name: String,
    full_name: String,
    image_url: Option<String>,
}

/// Column holding the chat id for this kind of chat
fn chat_column(chat: ChatRef) -> &'static str {
    match chat {
        ChatRef::Private(_) => "private_chat_id",
        ChatRef::Group(_) => "group_chat_id",
    }
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(c) if c.contains("email") => "email",
                Some(c) if c.contains("user_name") => "user_name",
                _ => "record",
            };
            return StoreError::Conflict(field.to_string());
        }
    }
    StoreError::Database(err)
}

/// Escape LIKE wildcards so the query is matched literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Message storage backed by the `messages` table
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn insert(&self, message: NewMessage) -> StoreResult<Message> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            INSERT INTO messages (text, is_read, user_id, private_chat_id, group_chat_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(&message.text)
        .bind(message.is_read)
        .bind(message.author_id)
        .bind(message.chat.private_chat_id())
        .bind(message.chat.group_chat_id())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, id: i64) -> StoreResult<Option<Message>> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Message::try_from).transpose()
    }

    async fn mark_read(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_chat_read(&self, chat: ChatRef, reader: Uuid) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(&format!(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE {} = $1 AND user_id <> $2 AND is_read = FALSE
            "#,
            chat_column(chat)
        ))
        .bind(chat.id())
        .bind(reader)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn list_for_chat(&self, chat: ChatRef) -> StoreResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE {} = $1
            ORDER BY created_at ASC, id ASC
            "#,
            chat_column(chat)
        ))
        .bind(chat.id())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }
}

/// Chat lookups backed by `private_chats`, `group_chats` and `group_chat_members`
#[derive(Clone)]
pub struct PgChatDirectory {
    pool: PgPool,
}

impl PgChatDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatDirectory for PgChatDirectory {
    async fn exists(&self, chat: ChatRef) -> StoreResult<bool> {
        let sql = match chat {
            ChatRef::Private(_) => "SELECT EXISTS(SELECT 1 FROM private_chats WHERE id = $1)",
            ChatRef::Group(_) => "SELECT EXISTS(SELECT 1 FROM group_chats WHERE id = $1)",
        };

        let exists: bool = sqlx::query_scalar(sql)
            .bind(chat.id())
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create_private(&self, user_one: Uuid, user_two: Uuid) -> StoreResult<i64> {
        // idx_private_chats_pair makes concurrent creators for a pair collide here
        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO private_chats (user_one_id, user_two_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_one)
        .bind(user_two)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = inserted {
            return Ok(id);
        }

        let existing: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM private_chats
            WHERE LEAST(user_one_id, user_two_id) = LEAST($1::uuid, $2::uuid)
              AND GREATEST(user_one_id, user_two_id) = GREATEST($1::uuid, $2::uuid)
            "#,
        )
        .bind(user_one)
        .bind(user_two)
        .fetch_optional(&self.pool)
        .await?;

        existing.ok_or_else(|| {
            StoreError::Corrupt(format!(
                "private chat insert for {user_one}/{user_two} conflicted but no chat exists"
            ))
        })
    }

    async fn create_group(&self, name: &str, created_by: Uuid, members: &[Uuid]) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO group_chats (name, created_by) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let mut member_ids = vec![created_by];
        member_ids.extend(members.iter().copied().filter(|m| *m != created_by));

        sqlx::query(
            r#"
            INSERT INTO group_chat_members (group_chat_id, user_id)
            SELECT $1, member FROM UNNEST($2::uuid[]) AS member
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&member_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }
}

/// User records backed by `users` and `user_social_links`
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, user_name, full_name, password_hash, birth_date, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.user_name)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.birth_date)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_user_name(&self, user_name: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(user_name) = LOWER($1)"
        ))
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn list(&self, skip: i64, take: i64) -> StoreResult<(i64, Vec<User>)> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(take)
        .fetch_all(&self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok((count, users))
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE user_name ILIKE $1 OR full_name ILIKE $1
            ORDER BY user_name ASC
            "#
        ))
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn summaries(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, AuthorSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, user_name, full_name, image_url FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    r.id,
                    AuthorSummary {
                        id: r.id,
                        user_name: r.user_name,
                        full_name: r.full_name,
                        image_url: r.image_url,
                    },
                )
            })
            .collect())
    }

    async fn social_links(&self, user_id: Uuid) -> StoreResult<Vec<SocialLink>> {
        let links = sqlx::query_as::<_, (String, String)>(
            "SELECT name, url FROM user_social_links WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links
            .into_iter()
            .map(|(name, url)| SocialLink { name, url })
            .collect())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
        links: Option<&[SocialLink]>,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET full_name = $2,
                birth_date = COALESCE($3, birth_date),
                relationship_status = $4,
                occupation = $5,
                education = $6,
                status = $7,
                country = $8,
                phone_number = $9,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&update.full_name)
        .bind(update.birth_date)
        .bind(&update.relationship_status)
        .bind(&update.occupation)
        .bind(&update.education)
        .bind(&update.status)
        .bind(&update.country)
        .bind(&update.phone_number)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if let Some(links) = links {
            sqlx::query("DELETE FROM user_social_links WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            for link in links {
                sqlx::query("INSERT INTO user_social_links (user_id, name, url) VALUES ($1, $2, $3)")
                    .bind(user_id)
                    .bind(&link.name)
                    .bind(&link.url)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn replace_image(
        &self,
        user_id: Uuid,
        slot: ImageSlot,
        file_name: &str,
    ) -> StoreResult<Option<Option<String>>> {
        let sql = match slot {
            ImageSlot::Profile => {
                r#"
                WITH previous AS (
                    SELECT id, image_url AS file_name FROM users WHERE id = $1 FOR UPDATE
                )
                UPDATE users SET image_url = $2, updated_at = NOW()
                FROM previous
                WHERE users.id = previous.id
                RETURNING previous.file_name
                "#
            }
            ImageSlot::Cover => {
                r#"
                WITH previous AS (
                    SELECT id, cover_pic_url AS file_name FROM users WHERE id = $1 FOR UPDATE
                )
                UPDATE users SET cover_pic_url = $2, updated_at = NOW()
                FROM previous
                WHERE users.id = previous.id
                RETURNING previous.file_name
                "#
            }
        };

        let previous: Option<Option<String>> = sqlx::query_scalar(sql)
            .bind(user_id)
            .bind(file_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(previous)
    }

    async fn toggle_active(&self, user_id: Uuid) -> StoreResult<Option<bool>> {
        let active: Option<bool> = sqlx::query_scalar(
            "UPDATE users SET is_active = NOT is_active, updated_at = NOW() WHERE id = $1 RETURNING is_active",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(active)
    }
}
