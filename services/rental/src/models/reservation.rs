//! Reservation model and status lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a reservation.
///
/// Cancellation is reachable from every state (including COMPLETED); a
/// cancelled reservation is terminal. COMPLETED is only reachable from
/// IN_PROGRESS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::InProgress => "IN_PROGRESS",
            ReservationStatus::Completed => "COMPLETED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether a transition from `self` to `target` is permitted.
    ///
    /// Same-state transitions are always rejected.
    pub fn can_transition(&self, target: ReservationStatus) -> bool {
        use ReservationStatus::*;

        if *self == target {
            return false;
        }

        match self {
            Pending => matches!(target, Confirmed | Cancelled),
            Confirmed => matches!(target, InProgress | Cancelled),
            InProgress => matches!(target, Completed | Cancelled),
            Completed => matches!(target, Cancelled),
            Cancelled => false,
        }
    }

    /// Whether the owning user may still cancel this reservation themselves.
    pub fn user_cancellable(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Confirmed
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReservationStatus::Pending),
            "CONFIRMED" => Ok(ReservationStatus::Confirmed),
            "IN_PROGRESS" => Ok(ReservationStatus::InProgress),
            "COMPLETED" => Ok(ReservationStatus::Completed),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("Unknown reservation status: {}", other)),
        }
    }
}

/// Reservation entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub user_id: Uuid,
    pub car_id: i64,
    pub location_name: String,
    pub rental_at: DateTime<Utc>,
    pub return_at: Option<DateTime<Utc>>,
    pub passenger_count: Option<i32>,
    pub memo: Option<String>,
    pub status: ReservationStatus,
    pub total_amount: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// New reservation payload used by the repository
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: Uuid,
    pub car_id: i64,
    pub location_name: String,
    pub rental_at: DateTime<Utc>,
    pub return_at: Option<DateTime<Utc>>,
    pub passenger_count: Option<i32>,
    pub memo: Option<String>,
    pub status: ReservationStatus,
    pub total_amount: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::ReservationStatus::*;
    use super::*;

    const ALL: [ReservationStatus; 5] = [Pending, Confirmed, InProgress, Completed, Cancelled];

    #[test]
    fn permitted_transitions_match_table() {
        let allowed = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, InProgress),
            (Confirmed, Cancelled),
            (InProgress, Completed),
            (InProgress, Cancelled),
            (Completed, Cancelled),
        ];

        for from in ALL {
            for to in ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition(to),
                    expected,
                    "transition {} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn cancelled_is_terminal() {
        for to in ALL {
            assert!(!Cancelled.can_transition(to));
        }
    }

    #[test]
    fn same_state_is_rejected() {
        for status in ALL {
            assert!(!status.can_transition(status));
        }
    }

    #[test]
    fn user_cancellable_only_before_pickup() {
        assert!(Pending.user_cancellable());
        assert!(Confirmed.user_cancellable());
        assert!(!InProgress.user_cancellable());
        assert!(!Completed.user_cancellable());
        assert!(!Cancelled.user_cancellable());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<ReservationStatus>(), Ok(status));
        }
        assert!("UPCOMING".parse::<ReservationStatus>().is_err());
    }
}
