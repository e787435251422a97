//! Websocket subscription endpoint
//!
//! `GET /ws/tracking` upgrades and streams the three engine event kinds
//! as JSON until the client disconnects or falls too far behind. A
//! subscriber dropped for overflow sees its stream end; reconnecting is
//! the client's responsibility.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tracing::debug;

use super::handlers::ApiState;

pub async fn ws_tracking(State(state): State<ApiState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: ApiState) {
    let mut subscription = state.engine.subscribe();
    let id = subscription.id;
    debug!(subscriber = id, "websocket connected");

    loop {
        tokio::select! {
            event = subscription.recv() => {
                match event {
                    Some(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(_) => continue,
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    // Channel closed: dropped for overflow or engine gone
                    None => break,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    // Clients only send pings/closes; payloads are ignored
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.engine.unsubscribe(id);
    debug!(subscriber = id, "websocket disconnected");
}
