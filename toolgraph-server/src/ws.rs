//! `GET /api/v1/ws/:run_id`: streams one run's events to a WebSocket client.
//!
//! Frames are `{event_type, data, timestamp}`. The socket subscribes to the engine's
//! broadcast channel before sending `connected`, so nothing emitted after the upgrade is
//! missed; `connected.data.status` tells a late client whether the run already finished.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::app::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(run_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, run_id, state))
}

async fn handle_socket(socket: WebSocket, run_id: String, state: Arc<AppState>) {
    let mut events = state.events.stream();
    let (mut ws_tx, mut ws_rx) = socket.split();
    debug!(run_id = %run_id, "websocket connected");

    let status = match state.engine.find_run(&run_id).await {
        Ok(run) => run.map(|r| r.status.as_str()),
        Err(e) => {
            warn!(run_id = %run_id, error = %e, "run lookup failed");
            None
        }
    };
    let hello = frame(
        "connected",
        &run_id,
        json!({ "message": "WebSocket connected", "status": status }),
    );
    if ws_tx.send(Message::Text(hello)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if event.run_id() != Some(run_id.as_str()) {
                        continue;
                    }
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(run_id = %run_id, error = %e, "event not serializable");
                            continue;
                        }
                    };
                    if ws_tx.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Some(Err(e)) => warn!(run_id = %run_id, error = %e, "websocket fell behind, events dropped"),
                None => break,
            },
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = reply_to(&run_id, &text) {
                        if ws_tx.send(Message::Text(reply)).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(run_id = %run_id, error = %e, "websocket receive failed");
                    break;
                }
            },
        }
    }
    debug!(run_id = %run_id, "websocket disconnected");
}

/// Answer to a client text message: `pong` for `{"type":"ping"}`, `error` for unparsable
/// input, nothing otherwise.
fn reply_to(run_id: &str, text: &str) -> Option<String> {
    match serde_json::from_str::<Value>(text) {
        Ok(message) if message.get("type").and_then(Value::as_str) == Some("ping") => {
            Some(frame("pong", run_id, json!({ "message": "pong" })))
        }
        Ok(_) => None,
        Err(e) => Some(frame("error", run_id, json!({ "error": e.to_string() }))),
    }
}

/// Builds a frame shaped like a serialized `WorkflowEvent`, with `run_id` added to `data`.
fn frame(event_type: &str, run_id: &str, extra: Value) -> String {
    let mut data = serde_json::Map::new();
    data.insert("run_id".into(), json!(run_id));
    if let Value::Object(extra) = extra {
        data.extend(extra);
    }
    json!({
        "event_type": event_type,
        "data": data,
        "timestamp": Utc::now(),
    })
    .to_string()
}
