//! Notification repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::notification::{NewNotification, Notification, NotificationType};

/// Notification repository
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, notification_type, title, message, reservation_id, is_read, created_at, \
     scheduled_at, sent_at";

fn row_to_notification(row: &sqlx::postgres::PgRow) -> Result<Notification> {
    let notification_type: String = row.get("notification_type");
    let notification_type = notification_type
        .parse::<NotificationType>()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        notification_type,
        title: row.get("title"),
        message: row.get("message"),
        reservation_id: row.get("reservation_id"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
        scheduled_at: row.get("scheduled_at"),
        sent_at: row.get("sent_at"),
    })
}

impl NotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a notification row
    pub async fn insert(&self, new: &NewNotification) -> Result<Notification> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notifications
                (user_id, notification_type, title, message, reservation_id, scheduled_at, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}
            "#,
        ))
        .bind(new.user_id)
        .bind(new.notification_type.as_str())
        .bind(&new.title)
        .bind(&new.message)
        .bind(new.reservation_id)
        .bind(new.scheduled_at)
        .bind(new.sent_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_notification(&row)
    }

    /// List a user's notifications, newest first
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_notification).collect()
    }

    /// Count a user's unread notifications
    pub async fn count_unread(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Mark one notification read; ownership is enforced in the predicate
    pub async fn mark_read(&self, id: i64, user_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark all of a user's notifications read
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete one notification owned by the user
    pub async fn delete_one(&self, id: i64, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user's read notifications
    pub async fn delete_read(&self, user_id: Uuid) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND is_read = TRUE")
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// Delete all of a user's notifications
    pub async fn delete_all(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Scheduled notifications that are due and not yet sent
    pub async fn find_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE scheduled_at IS NOT NULL AND scheduled_at <= $1 AND sent_at IS NULL
            ORDER BY scheduled_at
            "#,
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_notification).collect()
    }

    /// Stamp a notification as sent
    pub async fn mark_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE notifications SET sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(sent_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
