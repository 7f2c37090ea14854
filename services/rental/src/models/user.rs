//! User model and related payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub birth_date: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub kakao_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// New user creation payload
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub birth_date: Option<NaiveDate>,
    pub phone_number: Option<String>,
}

/// Profile update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
}
