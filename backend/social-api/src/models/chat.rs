use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PrivateChat {
    pub id: i64,
    pub user_one_id: Uuid,
    pub user_two_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PrivateChat {
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.user_one_id == user_id || self.user_two_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct GroupChat {
    pub id: i64,
    pub name: String,
    pub created_by: Uuid,
    pub member_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}
