//! Per-user WebSocket session registry for live notification push
//!
//! Each connected client registers the sending half of a channel keyed by its
//! user id; pushes are best-effort and a closed channel just deregisters the
//! session. Only one session per user is kept, a new connection replaces the
//! previous one.

use axum::extract::ws::Message;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::Notification;

/// Registry of open notification sockets
#[derive(Clone, Default)]
pub struct NotificationHub {
    sessions: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<Message>>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user's session sender
    pub fn register(&self, user_id: Uuid, tx: mpsc::UnboundedSender<Message>) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(user_id, tx);
            info!("WebSocket session registered: user_id={}", user_id);
        }
    }

    /// Remove a user's session
    pub fn deregister(&self, user_id: Uuid) {
        if let Ok(mut sessions) = self.sessions.write() {
            if sessions.remove(&user_id).is_some() {
                info!("WebSocket session removed: user_id={}", user_id);
            }
        }
    }

    /// Whether the user currently has an open session
    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.sessions
            .read()
            .map(|sessions| sessions.contains_key(&user_id))
            .unwrap_or(false)
    }

    /// Number of connected users, for monitoring
    pub fn connected_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Send a raw JSON frame to a user's session; returns whether it was
    /// handed to an open session
    pub fn send_to_user(&self, user_id: Uuid, payload: &serde_json::Value) -> bool {
        let tx = {
            let Ok(sessions) = self.sessions.read() else {
                return false;
            };
            match sessions.get(&user_id) {
                Some(tx) => tx.clone(),
                None => {
                    debug!("No open WebSocket session: user_id={}", user_id);
                    return false;
                }
            }
        };

        if tx.send(Message::Text(payload.to_string())).is_err() {
            // Receiver side is gone, drop the stale session.
            self.deregister(user_id);
            return false;
        }

        true
    }

    /// Push a notification frame to a user's session
    pub fn push_notification(&self, notification: &Notification) -> bool {
        let payload = json!({
            "type": "NOTIFICATION_UPDATE",
            "data": notification,
        });
        self.send_to_user(notification.user_id, &payload)
    }

    /// Push an unread-count update to a user's session
    pub fn push_unread_count(&self, user_id: Uuid, unread_count: i64) -> bool {
        let payload = json!({
            "type": "UNREAD_COUNT_UPDATE",
            "unreadCount": unread_count,
        });
        self.send_to_user(user_id, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationType;
    use chrono::Utc;

    fn sample_notification(user_id: Uuid) -> Notification {
        Notification {
            id: 1,
            user_id,
            notification_type: NotificationType::ReservationConfirmed,
            title: "Reservation confirmed!".to_string(),
            message: "Your rental is booked.".to_string(),
            reservation_id: Some(7),
            is_read: false,
            created_at: Utc::now(),
            scheduled_at: None,
            sent_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn push_reaches_registered_session() {
        let hub = NotificationHub::new();
        let user_id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();

        hub.register(user_id, tx);
        assert!(hub.is_connected(user_id));
        assert!(hub.push_notification(&sample_notification(user_id)));

        let frame = rx.recv().await.expect("frame");
        let Message::Text(text) = frame else {
            panic!("expected text frame");
        };
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["type"], "NOTIFICATION_UPDATE");
        assert_eq!(value["data"]["reservation_id"], 7);
    }

    #[tokio::test]
    async fn push_without_session_is_a_noop() {
        let hub = NotificationHub::new();
        assert!(!hub.push_notification(&sample_notification(Uuid::new_v4())));
    }

    #[tokio::test]
    async fn closed_session_is_dropped_on_send() {
        let hub = NotificationHub::new();
        let user_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        hub.register(user_id, tx);
        drop(rx);

        assert!(!hub.push_unread_count(user_id, 3));
        assert!(!hub.is_connected(user_id));
    }

    #[tokio::test]
    async fn deregister_removes_session() {
        let hub = NotificationHub::new();
        let user_id = Uuid::new_v4();
        let (tx, _rx) = mpsc::unbounded_channel();

        hub.register(user_id, tx);
        assert_eq!(hub.connected_count(), 1);

        hub.deregister(user_id);
        assert_eq!(hub.connected_count(), 0);
    }
}
