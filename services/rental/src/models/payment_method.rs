//! Saved payment method model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A card saved to a user's wallet.
///
/// At most one card per user carries `is_default`; setting it on a new card
/// clears the flag on the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub user_id: Uuid,
    pub card_number: String,
    pub card_company: String,
    pub card_expiry: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// New card payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewPaymentMethod {
    pub card_number: String,
    pub card_company: String,
    pub card_expiry: String,
    #[serde(default)]
    pub is_default: bool,
}
