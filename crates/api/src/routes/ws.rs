//! WebSocket endpoint for real-time notification delivery.
//!
//! A client connects, then sends a join frame naming its identity; from
//! then on every notification dispatched to that identity arrives as a
//! `notification_received` frame. A connection is joined to exactly one
//! channel at a time (a later join frame moves it), joining is idempotent,
//! and registry membership is dropped when the socket closes.

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::any;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use mindmend_common::types::{ClientEvent, ServerEvent};
use mindmend_engine::registry::ConnectionRegistry;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", any(ws_handler))
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.registry.clone()))
}

async fn handle_socket(socket: WebSocket, registry: ConnectionRegistry) {
    let conn_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Outbound half: serialize registry events onto the socket until either
    // side goes away.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(frame) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound half: the only frame a client sends is the join.
    let mut joined: Option<Uuid> = None;
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::JoinUser { user_id }) => {
                    if let Some(prev) = joined
                        && prev != user_id
                    {
                        registry.unregister(prev, conn_id);
                    }
                    registry.register(user_id, conn_id, tx.clone());
                    joined = Some(user_id);
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "Ignoring unrecognized client frame");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some(user_id) = joined {
        registry.unregister(user_id, conn_id);
    }
    send_task.abort();
}
