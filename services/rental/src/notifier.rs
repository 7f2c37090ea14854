//! Notification service: immediate sends, reminder scheduling, and the
//! periodic dispatcher that flushes due scheduled notifications.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{NewNotification, Notification, NotificationType, Reservation};
use crate::repositories::NotificationRepository;
use crate::ws::NotificationHub;

/// One reminder the scheduler should deliver later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEntry {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub scheduled_at: DateTime<Utc>,
}

/// Reminders for a reservation: 24 hours and 1 hour before pickup, and
/// 1 hour before the return deadline when one is set. Instants already in
/// the past at planning time are skipped.
pub fn reminder_plan(
    rental_at: DateTime<Utc>,
    return_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<ReminderEntry> {
    let mut plan = Vec::new();

    let day_before = rental_at - Duration::hours(24);
    if day_before > now {
        plan.push(ReminderEntry {
            notification_type: NotificationType::Reminder24h,
            title: "Pickup tomorrow".to_string(),
            message: "Your rental starts in 24 hours. See you there!".to_string(),
            scheduled_at: day_before,
        });
    }

    let hour_before = rental_at - Duration::hours(1);
    if hour_before > now {
        plan.push(ReminderEntry {
            notification_type: NotificationType::Reminder1h,
            title: "Pickup in 1 hour".to_string(),
            message: "Your rental starts in 1 hour. Please head to the pickup location."
                .to_string(),
            scheduled_at: hour_before,
        });
    }

    if let Some(return_at) = return_at {
        let hour_before_return = return_at - Duration::hours(1);
        if hour_before_return > now {
            plan.push(ReminderEntry {
                notification_type: NotificationType::ReturnReminder,
                title: "Return in 1 hour".to_string(),
                message: "Your rental ends in 1 hour. Please return the car on time."
                    .to_string(),
                scheduled_at: hour_before_return,
            });
        }
    }

    plan
}

/// Creates notification rows and pushes them over open WebSocket sessions
#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    hub: NotificationHub,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, hub: NotificationHub) -> Self {
        Self { repo, hub }
    }

    /// Persist a notification as already sent and push it to the user's
    /// session if one is open
    pub async fn send_immediate(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        reservation_id: Option<i64>,
    ) -> Result<Notification> {
        let notification = self
            .repo
            .insert(&NewNotification {
                user_id,
                notification_type,
                title: title.to_string(),
                message: message.to_string(),
                reservation_id,
                scheduled_at: None,
                sent_at: Some(Utc::now()),
            })
            .await?;

        self.push(&notification).await;
        Ok(notification)
    }

    /// Persist a notification for later delivery by the dispatcher
    pub async fn schedule(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        reservation_id: Option<i64>,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Notification> {
        self.repo
            .insert(&NewNotification {
                user_id,
                notification_type,
                title: title.to_string(),
                message: message.to_string(),
                reservation_id,
                scheduled_at: Some(scheduled_at),
                sent_at: None,
            })
            .await
    }

    /// Confirmation plus the reminder plan for a new reservation
    pub async fn reservation_created(&self, reservation: &Reservation) -> Result<()> {
        self.send_immediate(
            reservation.user_id,
            NotificationType::ReservationConfirmed,
            "Reservation confirmed!",
            &format!(
                "Your rental from {} is booked.",
                reservation.location_name
            ),
            Some(reservation.id),
        )
        .await?;

        for entry in reminder_plan(reservation.rental_at, reservation.return_at, Utc::now()) {
            self.schedule(
                reservation.user_id,
                entry.notification_type,
                &entry.title,
                &entry.message,
                Some(reservation.id),
                entry.scheduled_at,
            )
            .await?;
        }

        Ok(())
    }

    /// Cancellation notice
    pub async fn reservation_cancelled(&self, reservation: &Reservation) -> Result<()> {
        self.send_immediate(
            reservation.user_id,
            NotificationType::ReservationCancelled,
            "Reservation cancelled",
            &format!("Reservation #{} has been cancelled.", reservation.id),
            Some(reservation.id),
        )
        .await?;
        Ok(())
    }

    /// Payment receipt notice
    pub async fn payment_completed(
        &self,
        user_id: Uuid,
        order_id: &str,
        amount: i64,
    ) -> Result<()> {
        self.send_immediate(
            user_id,
            NotificationType::PaymentCompleted,
            "Payment completed",
            &format!("Payment of {} for order {} was approved.", amount, order_id),
            None,
        )
        .await?;
        Ok(())
    }

    /// License review outcome notice
    pub async fn license_decided(&self, user_id: Uuid, approved: bool) -> Result<()> {
        let (ty, title, message) = if approved {
            (
                NotificationType::LicenseApproved,
                "License approved",
                "Your driver's license has been approved. You can now book rentals.",
            )
        } else {
            (
                NotificationType::LicenseRejected,
                "License rejected",
                "Your driver's license could not be verified. Please submit it again.",
            )
        };
        self.send_immediate(user_id, ty, title, message, None).await?;
        Ok(())
    }

    /// Deliver every scheduled notification whose time has come; returns how
    /// many were dispatched
    pub async fn dispatch_due(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.repo.find_due_scheduled(now).await?;
        let mut dispatched = 0;

        for mut notification in due {
            self.repo.mark_sent(notification.id, now).await?;
            notification.sent_at = Some(now);
            self.push(&notification).await;
            dispatched += 1;

            info!(
                "Dispatched scheduled notification: id={}, type={}, user_id={}",
                notification.id, notification.notification_type, notification.user_id
            );
        }

        Ok(dispatched)
    }

    async fn push(&self, notification: &Notification) {
        if !self.hub.push_notification(notification) {
            debug!(
                "User {} offline, notification {} stays in inbox",
                notification.user_id, notification.id
            );
            return;
        }

        // Keep the client badge in sync after a push.
        if let Ok(unread) = self.repo.count_unread(notification.user_id).await {
            self.hub.push_unread_count(notification.user_id, unread);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().expect("timestamp")
    }

    #[test]
    fn full_plan_for_a_far_future_reservation() {
        let now = at("2026-08-01T12:00:00Z");
        let rental = at("2026-08-10T10:00:00Z");
        let ret = at("2026-08-10T18:00:00Z");

        let plan = reminder_plan(rental, Some(ret), now);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].notification_type, NotificationType::Reminder24h);
        assert_eq!(plan[0].scheduled_at, at("2026-08-09T10:00:00Z"));
        assert_eq!(plan[1].notification_type, NotificationType::Reminder1h);
        assert_eq!(plan[1].scheduled_at, at("2026-08-10T09:00:00Z"));
        assert_eq!(plan[2].notification_type, NotificationType::ReturnReminder);
        assert_eq!(plan[2].scheduled_at, at("2026-08-10T17:00:00Z"));
    }

    #[test]
    fn past_reminder_instants_are_skipped() {
        let now = at("2026-08-10T09:30:00Z");
        let rental = at("2026-08-10T10:00:00Z");
        let ret = at("2026-08-10T18:00:00Z");

        // 24h and 1h marks are already behind us, only the return reminder
        // is still ahead.
        let plan = reminder_plan(rental, Some(ret), now);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].notification_type, NotificationType::ReturnReminder);
    }

    #[test]
    fn no_return_reminder_without_return_time() {
        let now = at("2026-08-01T12:00:00Z");
        let rental = at("2026-08-10T10:00:00Z");

        let plan = reminder_plan(rental, None, now);
        assert_eq!(plan.len(), 2);
        assert!(plan
            .iter()
            .all(|e| e.notification_type != NotificationType::ReturnReminder));
    }

    #[test]
    fn empty_plan_when_everything_is_past() {
        let now = at("2026-08-10T19:00:00Z");
        let rental = at("2026-08-10T10:00:00Z");
        let ret = at("2026-08-10T18:00:00Z");

        assert!(reminder_plan(rental, Some(ret), now).is_empty());
    }

    // Requires a live Postgres at DATABASE_URL.
    #[tokio::test]
    #[ignore]
    #[serial_test::serial]
    async fn dispatcher_stamps_exactly_the_due_rows() -> Result<()> {
        use crate::models::NewUser;
        use crate::repositories::UserRepository;
        use common::database::{init_pool, DatabaseConfig};

        let pool = init_pool(&DatabaseConfig::from_env()?).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let users = UserRepository::new(pool.clone());
        let user = users
            .create(&NewUser {
                username: format!("dispatch_{}", Uuid::new_v4().simple()),
                password: "wheels4hire".to_string(),
                display_name: "Dispatch Target".to_string(),
                birth_date: None,
                phone_number: None,
            })
            .await?;

        let repo = NotificationRepository::new(pool);
        let service = NotificationService::new(repo.clone(), NotificationHub::new());

        // A dispatch window far in the past keeps reminders scheduled by
        // other data out of this run.
        let now = at("2001-01-02T00:00:00Z");

        let due = service
            .schedule(
                user.id,
                NotificationType::Reminder1h,
                "Pickup in 1 hour",
                "Your rental starts in 1 hour.",
                None,
                at("2001-01-01T23:00:00Z"),
            )
            .await?;
        let future = service
            .schedule(
                user.id,
                NotificationType::ReturnReminder,
                "Return in 1 hour",
                "Your rental ends in 1 hour.",
                None,
                at("2001-01-03T00:00:00Z"),
            )
            .await?;
        let already_sent = service
            .send_immediate(
                user.id,
                NotificationType::ReservationConfirmed,
                "Reservation confirmed!",
                "Your rental is booked.",
                None,
            )
            .await?;

        assert_eq!(service.dispatch_due(now).await?, 1);

        let inbox = repo.find_by_user(user.id).await?;
        let by_id = |id: i64| inbox.iter().find(|n| n.id == id).expect("row");
        assert_eq!(by_id(due.id).sent_at, Some(now));
        assert_eq!(by_id(future.id).sent_at, None);
        assert_eq!(by_id(already_sent.id).sent_at, already_sent.sent_at);

        // A second pass finds nothing left to deliver.
        assert_eq!(service.dispatch_due(now).await?, 0);
        Ok(())
    }
}
