//! Admin statistics with a Redis-backed cache
//!
//! Aggregates are computed from the database and cached as JSON strings under
//! well-known keys. The cache is best-effort: a Redis failure degrades to a
//! recompute, never to an error. Eviction is handled by the scheduler jobs.

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use tracing::warn;

use common::cache::RedisPool;

use crate::repositories::{CatalogRepository, ReservationRepository, UserRepository};

pub const DASHBOARD_KEY: &str = "stats:dashboard";
pub const MONTHLY_KEY: &str = "stats:monthly";
pub const DAILY_KEY: &str = "stats:daily";
pub const VEHICLE_TYPES_KEY: &str = "stats:vehicle_types";
pub const REGIONS_KEY: &str = "stats:regions";
pub const REVENUE_KEY: &str = "stats:revenue";

pub const ALL_KEYS: [&str; 6] = [
    DASHBOARD_KEY,
    MONTHLY_KEY,
    DAILY_KEY,
    VEHICLE_TYPES_KEY,
    REGIONS_KEY,
    REVENUE_KEY,
];

/// Rental price for a car: one block per started 10 minutes.
///
/// A partial block is charged as a full one; a non-positive duration prices
/// at zero.
pub fn calculate_rental_price(
    price_per_10min: i32,
    rental_at: DateTime<Utc>,
    return_at: DateTime<Utc>,
) -> i64 {
    let minutes = (return_at - rental_at).num_minutes();
    if minutes <= 0 {
        return 0;
    }

    let mut blocks = minutes / 10;
    if minutes % 10 != 0 {
        blocks += 1;
    }
    blocks * price_per_10min as i64
}

/// One calendar month window, `[start, end)` in UTC days
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

fn next_month_start(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}

/// The last `n` calendar months up to and including the month of `today`,
/// oldest first
pub fn last_months(today: NaiveDate, n: u32) -> Vec<MonthWindow> {
    let mut year = today.year();
    let mut month = today.month();
    let mut windows = Vec::with_capacity(n as usize);

    for _ in 0..n {
        if let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(year, month, 1),
            next_month_start(year, month),
        ) {
            windows.push(MonthWindow {
                label: format!("{:04}-{:02}", year, month),
                start,
                end,
            });
        }

        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }

    windows.reverse();
    windows
}

/// The last `n` days up to and including `today`, oldest first
pub fn last_days(today: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (0..n as i64)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc)
}

const CAR_STATUSES: [&str; 3] = ["AVAILABLE", "RENTED", "MAINTENANCE"];
const VEHICLE_TYPES: [&str; 5] = ["COMPACT", "MIDSIZE", "FULLSIZE", "SUV", "VAN"];

/// Counts keyed by name, with every expected key present even when zero
fn counts_with_defaults(counts: Vec<(String, i64)>, defaults: &[&str]) -> serde_json::Map<String, Value> {
    let mut map: serde_json::Map<String, Value> = defaults
        .iter()
        .map(|key| (key.to_string(), json!(0)))
        .collect();
    for (key, count) in counts {
        map.insert(key, json!(count));
    }
    map
}

/// Admin statistics service
#[derive(Clone)]
pub struct StatsService {
    reservations: ReservationRepository,
    users: UserRepository,
    catalog: CatalogRepository,
    cache: RedisPool,
}

impl StatsService {
    pub fn new(
        reservations: ReservationRepository,
        users: UserRepository,
        catalog: CatalogRepository,
        cache: RedisPool,
    ) -> Self {
        Self {
            reservations,
            users,
            catalog,
            cache,
        }
    }

    async fn cached(&self, key: &str) -> Option<Value> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Stats cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn store(&self, key: &str, value: &Value) {
        if let Err(e) = self.cache.set(key, &value.to_string(), None).await {
            warn!("Stats cache write failed for {}: {}", key, e);
        }
    }

    /// Evict a set of cached aggregates
    pub async fn evict(&self, keys: &[&str]) {
        if let Err(e) = self.cache.delete_many(keys).await {
            warn!("Stats cache eviction failed: {}", e);
        }
    }

    /// Headline counts for the admin dashboard
    pub async fn dashboard(&self) -> Result<Value> {
        if let Some(cached) = self.cached(DASHBOARD_KEY).await {
            return Ok(cached);
        }

        let today = Utc::now().date_naive();
        let today_start = day_start(today);
        let tomorrow_start = day_start(today + Duration::days(1));

        let total_users = self.users.count().await?;
        let total_reservations = self.reservations.count().await?;
        let total_cars = self.catalog.count_cars().await?;
        let total_locations = self.catalog.count_locations().await?;
        let reservations_today = self
            .reservations
            .count_between(today_start, tomorrow_start)
            .await?;

        let status_counts: Value = self
            .reservations
            .status_stats()
            .await?
            .into_iter()
            .map(|(status, count)| (status, json!(count)))
            .collect::<serde_json::Map<_, _>>()
            .into();
        let car_status_counts: Value =
            counts_with_defaults(self.catalog.car_status_stats().await?, &CAR_STATUSES).into();
        let (mut approved_licenses, mut pending_licenses) = (0, 0);
        for (approved, count) in self.catalog.license_stats().await? {
            if approved {
                approved_licenses = count;
            } else {
                pending_licenses = count;
            }
        }

        let value = json!({
            "total_users": total_users,
            "total_reservations": total_reservations,
            "total_cars": total_cars,
            "total_locations": total_locations,
            "reservations_today": reservations_today,
            "status_counts": status_counts,
            "car_status_counts": car_status_counts,
            "approved_licenses": approved_licenses,
            "pending_licenses": pending_licenses,
        });

        self.store(DASHBOARD_KEY, &value).await;
        Ok(value)
    }

    /// Reservation counts for the last 6 calendar months
    pub async fn monthly(&self) -> Result<Value> {
        if let Some(cached) = self.cached(MONTHLY_KEY).await {
            return Ok(cached);
        }

        let mut months = Vec::new();
        for window in last_months(Utc::now().date_naive(), 6) {
            let count = self
                .reservations
                .count_between(day_start(window.start), day_start(window.end))
                .await?;
            months.push(json!({ "month": window.label, "count": count }));
        }

        let value = json!({ "months": months });
        self.store(MONTHLY_KEY, &value).await;
        Ok(value)
    }

    /// Reservation counts for the last 7 days
    pub async fn daily(&self) -> Result<Value> {
        if let Some(cached) = self.cached(DAILY_KEY).await {
            return Ok(cached);
        }

        let mut days = Vec::new();
        for date in last_days(Utc::now().date_naive(), 7) {
            let count = self
                .reservations
                .count_between(day_start(date), day_start(date + Duration::days(1)))
                .await?;
            days.push(json!({ "date": date.to_string(), "count": count }));
        }

        let value = json!({ "days": days });
        self.store(DAILY_KEY, &value).await;
        Ok(value)
    }

    /// Reservation counts grouped by vehicle type
    pub async fn vehicle_types(&self) -> Result<Value> {
        if let Some(cached) = self.cached(VEHICLE_TYPES_KEY).await {
            return Ok(cached);
        }

        let counts =
            counts_with_defaults(self.reservations.vehicle_type_stats().await?, &VEHICLE_TYPES);

        let value = json!({ "vehicle_types": counts });
        self.store(VEHICLE_TYPES_KEY, &value).await;
        Ok(value)
    }

    /// Reservation counts grouped by pickup region
    pub async fn regions(&self) -> Result<Value> {
        if let Some(cached) = self.cached(REGIONS_KEY).await {
            return Ok(cached);
        }

        let counts: Vec<Value> = self
            .reservations
            .region_stats()
            .await?
            .into_iter()
            .map(|(region, count)| json!({ "region": region, "count": count }))
            .collect();

        let value = json!({ "regions": counts });
        self.store(REGIONS_KEY, &value).await;
        Ok(value)
    }

    /// Revenue for the last 6 calendar months.
    ///
    /// Reservations without a recorded total are priced from the car's rate
    /// table when they have a return time.
    pub async fn revenue(&self) -> Result<Value> {
        if let Some(cached) = self.cached(REVENUE_KEY).await {
            return Ok(cached);
        }

        let mut months = Vec::new();
        for window in last_months(Utc::now().date_naive(), 6) {
            let start = day_start(window.start);
            let end = day_start(window.end);

            let mut revenue = self.reservations.total_revenue_between(start, end).await?;
            for reservation in self.reservations.find_unpriced_between(start, end).await? {
                let Some(return_at) = reservation.return_at else {
                    continue;
                };
                if let Some(price) = self
                    .catalog
                    .car_price_per_10min(reservation.car_id)
                    .await?
                {
                    revenue += calculate_rental_price(price, reservation.rental_at, return_at);
                }
            }

            months.push(json!({ "month": window.label, "revenue": revenue }));
        }

        let value = json!({ "months": months });
        self.store(REVENUE_KEY, &value).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().expect("timestamp")
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().expect("date")
    }

    #[test]
    fn exact_blocks_price_exactly() {
        let price = calculate_rental_price(
            1000,
            at("2026-08-10T10:00:00Z"),
            at("2026-08-10T11:00:00Z"),
        );
        assert_eq!(price, 6000);
    }

    #[test]
    fn partial_block_is_charged_in_full() {
        // 25 minutes is two full blocks plus a started third.
        let price = calculate_rental_price(
            1000,
            at("2026-08-10T10:00:00Z"),
            at("2026-08-10T10:25:00Z"),
        );
        assert_eq!(price, 3000);

        // Even a 1-minute rental pays a full block.
        let price = calculate_rental_price(
            1000,
            at("2026-08-10T10:00:00Z"),
            at("2026-08-10T10:01:00Z"),
        );
        assert_eq!(price, 1000);
    }

    #[test]
    fn non_positive_duration_prices_at_zero() {
        let start = at("2026-08-10T10:00:00Z");
        assert_eq!(calculate_rental_price(1000, start, start), 0);
        assert_eq!(
            calculate_rental_price(1000, start, at("2026-08-10T09:00:00Z")),
            0
        );
    }

    #[test]
    fn month_windows_cover_a_year_boundary() {
        let windows = last_months(day("2026-02-15"), 3);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].label, "2025-12");
        assert_eq!(windows[0].start, day("2025-12-01"));
        assert_eq!(windows[0].end, day("2026-01-01"));
        assert_eq!(windows[1].label, "2026-01");
        assert_eq!(windows[2].label, "2026-02");
        assert_eq!(windows[2].end, day("2026-03-01"));
    }

    #[test]
    fn missing_categories_default_to_zero() {
        let map = counts_with_defaults(
            vec![("SUV".to_string(), 4), ("BUS".to_string(), 1)],
            &VEHICLE_TYPES,
        );
        assert_eq!(map["SUV"], 4);
        assert_eq!(map["COMPACT"], 0);
        assert_eq!(map["VAN"], 0);
        // Unexpected categories are still reported.
        assert_eq!(map["BUS"], 1);
    }

    #[test]
    fn day_windows_are_contiguous_and_end_today() {
        let days = last_days(day("2026-08-25"), 5);
        assert_eq!(days.first(), Some(&day("2026-08-21")));
        assert_eq!(days.last(), Some(&day("2026-08-25")));
        for pair in days.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }
}
