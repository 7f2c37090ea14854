//! WebSocket endpoint for live notification push

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::AppState;

/// Upgrade to a notification socket for a user
pub async fn notifications_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    state.hub.register(user_id, tx);

    let greeting = json!({
        "type": "CONNECTION_SUCCESS",
        "user_id": user_id,
    });
    if socket.send(Message::Text(greeting.to_string())).await.is_err() {
        state.hub.deregister(user_id);
        return;
    }

    info!("Notification socket open: user_id={}", user_id);

    loop {
        tokio::select! {
            // Frames queued by the hub.
            frame = rx.recv() => {
                match frame {
                    Some(frame) => {
                        if socket.send(frame).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            // Client traffic; only pings and close matter.
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(other)) => {
                        debug!("Ignoring client frame on notification socket: {:?}", other);
                    }
                    Some(Err(e)) => {
                        debug!("Notification socket error for {}: {}", user_id, e);
                        break;
                    }
                }
            }
        }
    }

    state.hub.deregister(user_id);
    info!("Notification socket closed: user_id={}", user_id);
}
