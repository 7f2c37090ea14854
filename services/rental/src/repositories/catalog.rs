//! Catalog repository: cars, locations, hotels, and licenses

use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::catalog::{Car, Hotel, License, NewLicense, Location};

/// Catalog repository
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

fn row_to_car(row: &sqlx::postgres::PgRow) -> Car {
    Car {
        id: row.get("id"),
        vehicle_type_code: row.get("vehicle_type_code"),
        vehicle_type_name: row.get("vehicle_type_name"),
        car_number: row.get("car_number"),
        status: row.get("status"),
        image_url: row.get("image_url"),
        rent_price_per_10min: row.get("rent_price_per_10min"),
    }
}

fn row_to_license(row: &sqlx::postgres::PgRow) -> License {
    License {
        id: row.get("id"),
        user_id: row.get("user_id"),
        license_number: row.get("license_number"),
        license_expiry: row.get("license_expiry"),
        license_image_url: row.get("license_image_url"),
        approved: row.get("approved"),
    }
}

impl CatalogRepository {
    /// Create a new catalog repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List available cars with their vehicle type names
    pub async fn available_cars(&self) -> Result<Vec<Car>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.vehicle_type_code, vt.name AS vehicle_type_name, c.car_number,
                   c.status, c.image_url, c.rent_price_per_10min
            FROM cars c
            JOIN vehicle_types vt ON c.vehicle_type_code = vt.code
            WHERE c.status = 'AVAILABLE'
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_car).collect())
    }

    /// Rental price per 10 minutes for a car
    pub async fn car_price_per_10min(&self, car_id: i64) -> Result<Option<i32>> {
        let price: Option<i32> =
            sqlx::query_scalar("SELECT rent_price_per_10min FROM cars WHERE id = $1")
                .bind(car_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(price)
    }

    /// Whether a car exists
    pub async fn car_exists(&self, car_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cars WHERE id = $1")
            .bind(car_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Total number of cars
    pub async fn count_cars(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cars")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Car counts grouped by status
    pub async fn car_status_stats(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS cnt FROM cars GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get("status"), r.get("cnt")))
            .collect())
    }

    /// List all pickup locations
    pub async fn all_locations(&self) -> Result<Vec<Location>> {
        let rows = sqlx::query(
            r#"
            SELECT location_name, location_address, location_region, location_map_url,
                   stars, lat, lng
            FROM locations
            ORDER BY location_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Location {
                location_name: row.get("location_name"),
                location_address: row.get("location_address"),
                location_region: row.get("location_region"),
                location_map_url: row.get("location_map_url"),
                stars: row.get("stars"),
                lat: row.get("lat"),
                lng: row.get("lng"),
            })
            .collect())
    }

    /// Total number of pickup locations
    pub async fn count_locations(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// List hotels, optionally filtered by region
    pub async fn hotels(&self, region: Option<&str>) -> Result<Vec<Hotel>> {
        let rows = match region {
            Some(region) => {
                sqlx::query(
                    r#"
                    SELECT id, name, address, region, stars, lat, lng, image_url
                    FROM hotels WHERE region = $1 ORDER BY stars DESC, id
                    "#,
                )
                .bind(region)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, name, address, region, stars, lat, lng, image_url
                    FROM hotels ORDER BY stars DESC, id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .iter()
            .map(|row| Hotel {
                id: row.get("id"),
                name: row.get("name"),
                address: row.get("address"),
                region: row.get("region"),
                stars: row.get("stars"),
                lat: row.get("lat"),
                lng: row.get("lng"),
                image_url: row.get("image_url"),
            })
            .collect())
    }

    /// List a user's license records
    pub async fn licenses_by_user(&self, user_id: Uuid) -> Result<Vec<License>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, license_number, license_expiry, license_image_url, approved
            FROM licenses WHERE user_id = $1 ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_license).collect())
    }

    /// Submit a license record (pending approval)
    pub async fn insert_license(&self, user_id: Uuid, new: &NewLicense) -> Result<License> {
        let row = sqlx::query(
            r#"
            INSERT INTO licenses (user_id, license_number, license_expiry, license_image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, license_number, license_expiry, license_image_url, approved
            "#,
        )
        .bind(user_id)
        .bind(&new.license_number)
        .bind(new.license_expiry)
        .bind(&new.license_image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_license(&row))
    }

    /// Set a license's approval flag; returns the updated record if it exists
    pub async fn set_license_approved(&self, id: i64, approved: bool) -> Result<Option<License>> {
        let row = sqlx::query(
            r#"
            UPDATE licenses SET approved = $2
            WHERE id = $1
            RETURNING id, user_id, license_number, license_expiry, license_image_url, approved
            "#,
        )
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_license(&r)))
    }

    /// License counts grouped by approval state
    pub async fn license_stats(&self) -> Result<Vec<(bool, i64)>> {
        let rows = sqlx::query("SELECT approved, COUNT(*) AS cnt FROM licenses GROUP BY approved")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get("approved"), r.get("cnt")))
            .collect())
    }
}
