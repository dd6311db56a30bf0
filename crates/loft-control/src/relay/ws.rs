//! WebSocket endpoint for live log observation.
//!
//! A client connects to `GET /logs` and sends control frames of the form
//! `{"subscribe": "<project>"}`. Each subscription joins the connection to
//! the project's log topic and is acknowledged immediately. Log lines then
//! arrive as `{"type": "log", ...}` events until the connection closes.
//! Closing the connection deregisters the observer from every topic it
//! joined — the registration guard drops on every exit path.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use loft_core::{log_topic, project_from_topic, ProjectId};

use crate::api::AppState;

use super::rooms::{LogEvent, RoomGuard, Rooms, OBSERVER_BUFFER};

/// Control frame sent by an observer.
#[derive(Debug, Deserialize)]
struct ControlFrame {
    /// Project identifier to subscribe to.
    subscribe: String,
}

/// Upgrade handler for `GET /logs`.
pub async fn logs_ws(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let rooms = Arc::clone(&state.rooms);
    ws.on_upgrade(move |socket| handle_socket(socket, rooms))
}

async fn handle_socket(socket: WebSocket, rooms: Arc<Rooms>) {
    let (events_tx, mut events_rx) = mpsc::channel::<LogEvent>(OBSERVER_BUFFER);
    let mut guard = rooms.register(events_tx);

    debug!(observer = %guard.id(), "log observer connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_control_frame(&mut guard, text.as_str());
                        if sink.send(Message::Text(reply.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary/ping/pong frames carry no control meaning
                    Some(Err(e)) => {
                        debug!(observer = %guard.id(), error = %e, "observer socket error");
                        break;
                    }
                }
            }
            event = events_rx.recv() => {
                let Some(event) = event else { break };
                let frame = log_frame(&event);
                if sink.send(Message::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    debug!(observer = %guard.id(), "log observer disconnected");
    // `guard` drops here: the observer leaves every joined topic.
}

/// Apply one control frame and produce the reply event.
fn handle_control_frame(guard: &mut RoomGuard, text: &str) -> serde_json::Value {
    match serde_json::from_str::<ControlFrame>(text) {
        Ok(frame) if !frame.subscribe.trim().is_empty() => {
            let project = ProjectId::new(frame.subscribe.trim());
            let topic = log_topic(&project);
            guard.join(&topic);
            serde_json::json!({
                "type": "subscribed",
                "project": project.as_str(),
                "topic": topic,
            })
        }
        Ok(_) => serde_json::json!({
            "type": "error",
            "error": "project identifier cannot be empty",
        }),
        Err(_) => serde_json::json!({
            "type": "error",
            "error": "expected a control frame like {\"subscribe\": \"<project>\"}",
        }),
    }
}

/// Render a relayed log line as an outbound event.
fn log_frame(event: &LogEvent) -> serde_json::Value {
    let project = project_from_topic(&event.topic)
        .map_or_else(|| event.topic.to_string(), |id| id.to_string());
    serde_json::json!({
        "type": "log",
        "project": project,
        "line": &*event.line,
    })
}
