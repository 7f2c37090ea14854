//! User repository for database operations

use anyhow::Result;
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::Rng;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::user::{NewUser, UpdateProfile, User};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        role: row.get("role"),
        birth_date: row.get("birth_date"),
        phone_number: row.get("phone_number"),
        kakao_id: row.get("kakao_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, display_name, role, birth_date, \
                            phone_number, kakao_id, created_at, updated_at";

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(hash)
    }

    /// Create a new user with role `user`
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.username);

        let password_hash = Self::hash_password(&new_user.password)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, password_hash, display_name, role, birth_date, phone_number)
            VALUES ($1, $2, $3, 'user', $4, $5)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(&new_user.username)
        .bind(&password_hash)
        .bind(&new_user.display_name)
        .bind(new_user.birth_date)
        .bind(&new_user.phone_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_user(&row))
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    /// Verify a user's password
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        let argon2 = Argon2::default();
        Ok(argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Find an OAuth user by Kakao account id, registering one if absent
    pub async fn find_or_create_by_kakao(
        &self,
        kakao_id: i64,
        nickname: &str,
    ) -> Result<User> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE kakao_id = $1"
        ))
        .bind(kakao_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row_to_user(&row));
        }

        info!("Registering new Kakao user: kakao_id={}", kakao_id);

        // OAuth users never log in with a password; store a hash of random
        // bytes so the column invariant holds.
        let random_password: String = rand::thread_rng()
            .sample_iter(rand::distributions::Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let password_hash = Self::hash_password(&random_password)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, password_hash, display_name, role, kakao_id)
            VALUES ($1, $2, $3, 'user', $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(format!("kakao_{}", kakao_id))
        .bind(&password_hash)
        .bind(nickname)
        .bind(kakao_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_user(&row))
    }

    /// List all users, newest first
    pub async fn find_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    /// Update a user's role; returns the updated user if it exists
    pub async fn update_role(&self, id: Uuid, role: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET role = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    /// Update profile fields; returns the updated user if it exists
    pub async fn update_profile(&self, id: Uuid, update: &UpdateProfile) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                phone_number = COALESCE($3, phone_number),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&update.display_name)
        .bind(&update.phone_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    /// Delete a user; returns whether a row was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of users
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
