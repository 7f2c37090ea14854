//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ReservationConfirmed,
    ReservationCancelled,
    Reminder24h,
    Reminder1h,
    ReturnReminder,
    PaymentCompleted,
    LicenseApproved,
    LicenseRejected,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::ReservationConfirmed => "RESERVATION_CONFIRMED",
            NotificationType::ReservationCancelled => "RESERVATION_CANCELLED",
            NotificationType::Reminder24h => "REMINDER_24H",
            NotificationType::Reminder1h => "REMINDER_1H",
            NotificationType::ReturnReminder => "RETURN_REMINDER",
            NotificationType::PaymentCompleted => "PAYMENT_COMPLETED",
            NotificationType::LicenseApproved => "LICENSE_APPROVED",
            NotificationType::LicenseRejected => "LICENSE_REJECTED",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESERVATION_CONFIRMED" => Ok(NotificationType::ReservationConfirmed),
            "RESERVATION_CANCELLED" => Ok(NotificationType::ReservationCancelled),
            "REMINDER_24H" => Ok(NotificationType::Reminder24h),
            "REMINDER_1H" => Ok(NotificationType::Reminder1h),
            "RETURN_REMINDER" => Ok(NotificationType::ReturnReminder),
            "PAYMENT_COMPLETED" => Ok(NotificationType::PaymentCompleted),
            "LICENSE_APPROVED" => Ok(NotificationType::LicenseApproved),
            "LICENSE_REJECTED" => Ok(NotificationType::LicenseRejected),
            other => Err(format!("Unknown notification type: {}", other)),
        }
    }
}

/// Notification entity
///
/// `sent_at` is non-null exactly when the notification has been dispatched:
/// immediate notifications are written already sent, scheduled ones are
/// stamped by the dispatcher once `scheduled_at` has passed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub reservation_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// New notification payload used by the repository
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub reservation_id: Option<i64>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_round_trips_through_strings() {
        let all = [
            NotificationType::ReservationConfirmed,
            NotificationType::ReservationCancelled,
            NotificationType::Reminder24h,
            NotificationType::Reminder1h,
            NotificationType::ReturnReminder,
            NotificationType::PaymentCompleted,
            NotificationType::LicenseApproved,
            NotificationType::LicenseRejected,
        ];
        for ty in all {
            assert_eq!(ty.as_str().parse::<NotificationType>(), Ok(ty));
        }
        assert!("SMS".parse::<NotificationType>().is_err());
    }
}
