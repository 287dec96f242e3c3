//! Real-time broadcast gateway (§6 "Real-time broadcast wire events").
//!
//! One websocket connection per viewer of a room: every [`RoomEvent`]
//! published for that room is forwarded as a JSON text frame, and incoming
//! click messages are routed to the running session's click channel
//! (`GameOrchestrator::run_game`'s `IncomingClick` sink) via the scheduler's
//! per-session registry. The channel is partitioned per room (§5 "no
//! cross-room message ordering is promised").

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use adaptive_game::IncomingClick;

use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IncomingMessage {
    Click {
        session_id: String,
        participant_id: String,
        clue_id: String,
        row: u8,
        col: u8,
    },
}

pub async fn room_socket(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, room_id, socket))
}

async fn handle_socket(state: Arc<AppState>, room_id: String, socket: WebSocket) {
    let mut rx = state.broadcaster.subscribe(&room_id);
    let (mut sender, mut receiver) = socket.split();

    let forward_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Ok(payload) = serde_json::to_string(&event) else { continue };
                    if sender.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(room_id = %room_id, skipped, "websocket consumer lagged, dropping events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else { continue };
        let Ok(IncomingMessage::Click { session_id, participant_id, clue_id, row, col }) =
            serde_json::from_str::<IncomingMessage>(&text)
        else {
            continue;
        };

        let Some(sink) = state.scheduler.click_sink(&session_id) else {
            tracing::debug!(session_id = %session_id, "click received for session with no active sink");
            continue;
        };

        let click = IncomingClick {
            participant_id,
            position: (row, col),
            clue_id,
            answered_at: Utc::now(),
        };
        let _ = sink.send(click).await;
    }

    forward_task.abort();
}
