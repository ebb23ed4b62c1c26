use super::normalize_image_path;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Which of the two profile pictures an upload replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Profile,
    Cover,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    pub full_name: String,
    pub password_hash: String,
    pub birth_date: NaiveDate,
    pub role: Role,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub cover_pic_url: Option<String>,
    pub relationship_status: Option<String>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub user_name: String,
    pub full_name: String,
    pub password_hash: String,
    pub birth_date: NaiveDate,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SocialLink {
    pub name: String,
    pub url: String,
}

/// Editable profile fields. Optional text fields overwrite the stored value,
/// a missing birth date keeps the current one.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub relationship_status: Option<String>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    pub phone_number: Option<String>,
}

/// Full profile as returned to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub role: Role,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub cover_pic_url: Option<String>,
    pub relationship_status: Option<String>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    pub phone_number: Option<String>,
    pub social_links: Vec<SocialLink>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user: User, social_links: Vec<SocialLink>, image_base: &str) -> Self {
        Self {
            id: user.id,
            email: user.email,
            user_name: user.user_name,
            full_name: user.full_name,
            birth_date: user.birth_date,
            role: user.role,
            is_active: user.is_active,
            image_url: normalize_image_path(user.image_url, image_base),
            cover_pic_url: normalize_image_path(user.cover_pic_url, image_base),
            relationship_status: user.relationship_status,
            occupation: user.occupation,
            education: user.education,
            status: user.status,
            country: user.country,
            phone_number: user.phone_number,
            social_links,
            created_at: user.created_at,
        }
    }
}

/// Listing entry for user lists and search results
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub user_name: String,
    pub full_name: String,
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl UserSummary {
    pub fn new(user: User, image_base: &str) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name,
            full_name: user.full_name,
            image_url: normalize_image_path(user.image_url, image_base),
            is_active: user.is_active,
        }
    }
}
