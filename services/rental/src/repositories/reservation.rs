//! Reservation repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::reservation::{NewReservation, Reservation, ReservationStatus};

/// Reservation repository
#[derive(Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

const RESERVATION_COLUMNS: &str =
    "id, user_id, car_id, location_name, rental_at, return_at, passenger_count, memo, status, \
     total_amount, created_at";

fn row_to_reservation(row: &sqlx::postgres::PgRow) -> Result<Reservation> {
    let status: String = row.get("status");
    let status = status
        .parse::<ReservationStatus>()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(Reservation {
        id: row.get("id"),
        user_id: row.get("user_id"),
        car_id: row.get("car_id"),
        location_name: row.get("location_name"),
        rental_at: row.get("rental_at"),
        return_at: row.get("return_at"),
        passenger_count: row.get("passenger_count"),
        memo: row.get("memo"),
        status,
        total_amount: row.get("total_amount"),
        created_at: row.get("created_at"),
    })
}

impl ReservationRepository {
    /// Create a new reservation repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new reservation
    pub async fn create(&self, new: &NewReservation) -> Result<Reservation> {
        info!(
            "Creating reservation: user_id={}, car_id={}",
            new.user_id, new.car_id
        );

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO reservations
                (user_id, car_id, location_name, rental_at, return_at, passenger_count,
                 memo, status, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RESERVATION_COLUMNS}
            "#,
        ))
        .bind(new.user_id)
        .bind(new.car_id)
        .bind(&new.location_name)
        .bind(new.rental_at)
        .bind(new.return_at)
        .bind(new.passenger_count)
        .bind(&new.memo)
        .bind(new.status.as_str())
        .bind(new.total_amount)
        .fetch_one(&self.pool)
        .await?;

        row_to_reservation(&row)
    }

    /// Find a reservation by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_reservation(&r)).transpose()
    }

    /// List a user's reservations, newest first
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE user_id = $1 ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reservation).collect()
    }

    /// List a user's reservations with a given status, newest first
    pub async fn find_by_user_and_status(
        &self,
        user_id: Uuid,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE user_id = $1 AND status = $2
            ORDER BY id DESC
            "#,
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reservation).collect()
    }

    /// List all reservations with paging, newest first
    pub async fn find_all(&self, page: u32, size: u32) -> Result<Vec<Reservation>> {
        let size = size.clamp(1, 100);
        let offset = page as i64 * size as i64;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reservation).collect()
    }

    /// List all reservations with a given status with paging, newest first
    pub async fn find_by_status(
        &self,
        status: ReservationStatus,
        page: u32,
        size: u32,
    ) -> Result<Vec<Reservation>> {
        let size = size.clamp(1, 100);
        let offset = page as i64 * size as i64;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE status = $1
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(status.as_str())
        .bind(size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reservation).collect()
    }

    /// Update status (and optionally the return timestamp); returns the
    /// updated reservation if it exists
    pub async fn update_status(
        &self,
        id: i64,
        status: ReservationStatus,
        return_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE reservations
            SET status = $2, return_at = COALESCE($3, return_at)
            WHERE id = $1
            RETURNING {RESERVATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(return_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_reservation(&r)).transpose()
    }

    /// Delete a reservation; returns whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of reservations
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Reservations whose rental instant falls in `[start, end)`
    pub async fn count_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE rental_at >= $1 AND rental_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Reservation counts grouped by status
    pub async fn status_stats(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS cnt FROM reservations GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get("status"), r.get("cnt")))
            .collect())
    }

    /// Reservation counts grouped by vehicle type
    pub async fn vehicle_type_stats(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT c.vehicle_type_code AS vehicle_type, COUNT(*) AS cnt
            FROM reservations r
            JOIN cars c ON r.car_id = c.id
            GROUP BY c.vehicle_type_code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get("vehicle_type"), r.get("cnt")))
            .collect())
    }

    /// Reservation counts grouped by pickup region
    pub async fn region_stats(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT l.location_region AS region, COUNT(*) AS cnt
            FROM reservations r
            JOIN locations l ON r.location_name = l.location_name
            GROUP BY l.location_region
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get("region"), r.get("cnt")))
            .collect())
    }

    /// Sum of recorded totals for rentals starting in `[start, end)`
    pub async fn total_revenue_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(total_amount) FROM reservations
            WHERE rental_at >= $1 AND rental_at < $2 AND total_amount IS NOT NULL
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.unwrap_or(0))
    }

    /// Reservations without a recorded total in `[start, end)`, for the
    /// price-table revenue fallback
    pub async fn find_unpriced_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE rental_at >= $1 AND rental_at < $2 AND total_amount IS NULL
            "#,
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reservation).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repositories::UserRepository;
    use common::database::{init_pool, DatabaseConfig};

    // Requires a live Postgres at DATABASE_URL.
    #[tokio::test]
    #[ignore]
    #[serial_test::serial]
    async fn completing_sets_status_and_return_time() -> Result<()> {
        let pool = init_pool(&DatabaseConfig::from_env()?).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let users = UserRepository::new(pool.clone());
        let user = users
            .create(&NewUser {
                username: format!("renter_{}", Uuid::new_v4().simple()),
                password: "wheels4hire".to_string(),
                display_name: "Renter".to_string(),
                birth_date: None,
                phone_number: None,
            })
            .await?;

        let car_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO cars (vehicle_type_code, car_number, rent_price_per_10min)
            VALUES ('COMPACT', $1, 1000)
            RETURNING id
            "#,
        )
        .bind(format!("77{}", &Uuid::new_v4().simple().to_string()[..6]))
        .fetch_one(&pool)
        .await?;

        let repo = ReservationRepository::new(pool);
        let reservation = repo
            .create(&NewReservation {
                user_id: user.id,
                car_id,
                location_name: "Gangnam Station".to_string(),
                rental_at: Utc::now() - chrono::Duration::hours(2),
                return_at: None,
                passenger_count: Some(2),
                memo: None,
                status: ReservationStatus::InProgress,
                total_amount: Some(12_000),
            })
            .await?;
        assert_eq!(reservation.status, ReservationStatus::InProgress);
        assert_eq!(reservation.return_at, None);

        // Whole-second instant survives the round trip through TIMESTAMPTZ.
        let returned_at: DateTime<Utc> = "2026-08-25T10:00:00Z".parse().expect("timestamp");
        let completed = repo
            .update_status(reservation.id, ReservationStatus::Completed, Some(returned_at))
            .await?
            .expect("reservation should exist");

        assert_eq!(completed.status, ReservationStatus::Completed);
        assert_eq!(completed.return_at, Some(returned_at));

        let reloaded = repo
            .find_by_id(reservation.id)
            .await?
            .expect("reservation should exist");
        assert_eq!(reloaded.status, ReservationStatus::Completed);
        assert!(reloaded.return_at.is_some());
        Ok(())
    }
}
