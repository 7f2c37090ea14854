//! Saved payment method repository

use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::payment_method::{NewPaymentMethod, PaymentMethod};

/// Payment method repository
#[derive(Clone)]
pub struct PaymentMethodRepository {
    pool: PgPool,
}

const PAYMENT_METHOD_COLUMNS: &str =
    "id, user_id, card_number, card_company, card_expiry, is_default, created_at";

fn row_to_payment_method(row: &sqlx::postgres::PgRow) -> PaymentMethod {
    PaymentMethod {
        id: row.get("id"),
        user_id: row.get("user_id"),
        card_number: row.get("card_number"),
        card_company: row.get("card_company"),
        card_expiry: row.get("card_expiry"),
        is_default: row.get("is_default"),
        created_at: row.get("created_at"),
    }
}

impl PaymentMethodRepository {
    /// Create a new payment method repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's saved cards, default card first
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<PaymentMethod>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods
            WHERE user_id = $1
            ORDER BY is_default DESC, id DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_payment_method).collect())
    }

    /// Save a card. A card saved as default clears the flag on the user's
    /// other cards so at most one is default.
    pub async fn insert(&self, user_id: Uuid, new: &NewPaymentMethod) -> Result<PaymentMethod> {
        let mut tx = self.pool.begin().await?;

        if new.is_default {
            sqlx::query("UPDATE payment_methods SET is_default = FALSE WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payment_methods
                (user_id, card_number, card_company, card_expiry, is_default)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PAYMENT_METHOD_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(&new.card_number)
        .bind(&new.card_company)
        .bind(&new.card_expiry)
        .bind(new.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row_to_payment_method(&row))
    }

    /// Delete one of the user's cards; ownership is enforced in the predicate
    pub async fn delete(&self, id: i64, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repositories::UserRepository;
    use common::database::{init_pool, DatabaseConfig};

    async fn test_pool() -> Result<PgPool> {
        let pool = init_pool(&DatabaseConfig::from_env()?).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(pool)
    }

    async fn test_user(pool: &PgPool) -> Result<Uuid> {
        let users = UserRepository::new(pool.clone());
        let user = users
            .create(&NewUser {
                username: format!("cards_{}", Uuid::new_v4().simple()),
                password: "wheels4hire".to_string(),
                display_name: "Card Holder".to_string(),
                birth_date: None,
                phone_number: None,
            })
            .await?;
        Ok(user.id)
    }

    fn card(number: &str, is_default: bool) -> NewPaymentMethod {
        NewPaymentMethod {
            card_number: number.to_string(),
            card_company: "Shinhan".to_string(),
            card_expiry: "12/28".to_string(),
            is_default,
        }
    }

    // Requires a live Postgres at DATABASE_URL.
    #[tokio::test]
    #[ignore]
    #[serial_test::serial]
    async fn default_card_is_exclusive() -> Result<()> {
        let pool = test_pool().await?;
        let repo = PaymentMethodRepository::new(pool.clone());
        let user_id = test_user(&pool).await?;

        repo.insert(user_id, &card("1111-2222-3333-4444", true)).await?;
        repo.insert(user_id, &card("5555-6666-7777-8888", true)).await?;

        let cards = repo.find_by_user(user_id).await?;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards.iter().filter(|c| c.is_default).count(), 1);
        // The default card sorts first.
        assert_eq!(cards[0].card_number, "5555-6666-7777-8888");

        assert!(repo.delete(cards[0].id, user_id).await?);
        assert!(!repo.delete(cards[0].id, Uuid::new_v4()).await?);
        Ok(())
    }
}
