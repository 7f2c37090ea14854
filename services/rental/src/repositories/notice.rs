//! Announcement board repository

use anyhow::Result;
use sqlx::{PgPool, Row};

use crate::models::notice::{Notice, NoticeInput};

/// Notice repository
#[derive(Clone)]
pub struct NoticeRepository {
    pool: PgPool,
}

const NOTICE_COLUMNS: &str = "id, category, title, content, writer, created_at, updated_at";

fn row_to_notice(row: &sqlx::postgres::PgRow) -> Notice {
    Notice {
        id: row.get("id"),
        category: row.get("category"),
        title: row.get("title"),
        content: row.get("content"),
        writer: row.get("writer"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl NoticeRepository {
    /// Create a new notice repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all notices, newest first
    pub async fn find_all(&self) -> Result<Vec<Notice>> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTICE_COLUMNS} FROM notices ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_notice).collect())
    }

    /// Publish a notice
    pub async fn insert(&self, input: &NoticeInput) -> Result<Notice> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notices (category, title, content, writer)
            VALUES ($1, $2, $3, $4)
            RETURNING {NOTICE_COLUMNS}
            "#,
        ))
        .bind(&input.category)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.writer)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_notice(&row))
    }

    /// Rewrite a notice; returns the updated notice if it exists
    pub async fn update(&self, id: i64, input: &NoticeInput) -> Result<Option<Notice>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE notices
            SET category = $2, title = $3, content = $4, writer = $5, updated_at = now()
            WHERE id = $1
            RETURNING {NOTICE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&input.category)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.writer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_notice(&r)))
    }

    /// Delete a notice; returns whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{init_pool, DatabaseConfig};

    fn input(title: &str) -> NoticeInput {
        NoticeInput {
            category: "SERVICE".to_string(),
            title: title.to_string(),
            content: "Pickup desks close early on holidays.".to_string(),
            writer: "ops".to_string(),
        }
    }

    // Requires a live Postgres at DATABASE_URL.
    #[tokio::test]
    #[ignore]
    #[serial_test::serial]
    async fn notice_lifecycle() -> Result<()> {
        let pool = init_pool(&DatabaseConfig::from_env()?).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        let repo = NoticeRepository::new(pool);

        let notice = repo.insert(&input("Holiday hours")).await?;
        assert_eq!(notice.title, "Holiday hours");

        let updated = repo
            .update(notice.id, &input("Holiday hours (revised)"))
            .await?
            .expect("notice should still exist");
        assert_eq!(updated.title, "Holiday hours (revised)");
        assert!(updated.updated_at >= notice.updated_at);

        let listed = repo.find_all().await?;
        assert!(listed.iter().any(|n| n.id == notice.id));

        assert!(repo.delete(notice.id).await?);
        assert!(!repo.delete(notice.id).await?);
        assert!(repo.update(notice.id, &input("gone")).await?.is_none());
        Ok(())
    }
}
