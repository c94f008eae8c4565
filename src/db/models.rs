use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::models::User;

/// Token and user persisted for one device/chat.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
    pub updated_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(token: String, user: User) -> Self {
        Self {
            token,
            user,
            updated_at: Utc::now(),
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
pub struct SessionRow {
    pub key: String,
    pub token: String,
    pub user_json: String,
    pub updated_at: DateTime<Utc>,
}
