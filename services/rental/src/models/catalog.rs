//! Catalog models: cars, locations, hotels, and driver licenses

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Car entity, joined with its vehicle type name for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub id: i64,
    pub vehicle_type_code: String,
    pub vehicle_type_name: String,
    pub car_number: String,
    pub status: String,
    pub image_url: Option<String>,
    pub rent_price_per_10min: i32,
}

/// Pickup location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub location_name: String,
    pub location_address: String,
    pub location_region: String,
    pub location_map_url: Option<String>,
    pub stars: i32,
    pub lat: f64,
    pub lng: f64,
}

/// Partner hotel, browsable alongside pickup locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub region: String,
    pub stars: i32,
    pub lat: f64,
    pub lng: f64,
    pub image_url: Option<String>,
}

/// Driver license record awaiting admin approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub id: i64,
    pub user_id: Uuid,
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub license_image_url: Option<String>,
    pub approved: bool,
}

/// License submission payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewLicense {
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub license_image_url: Option<String>,
}
