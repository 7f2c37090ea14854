//! Announcement board model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published announcement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: i64,
    pub category: String,
    pub title: String,
    pub content: String,
    pub writer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a notice
#[derive(Debug, Clone, Deserialize)]
pub struct NoticeInput {
    pub category: String,
    pub title: String,
    pub content: String,
    pub writer: String,
}
