//! `WebSocket` handler for the live engine event stream.
//!
//! Clients connect to `GET /ws/events` and receive every [`EngineEvent`]
//! as a JSON text frame. Text frames sent by the client are parsed as
//! [`ControlSignal`] values (`"start"`, `"advance"`, `"stop"`, `"reset"`)
//! and relayed to the driver, so a renderer can pace the engine over one
//! socket.
//!
//! If a client falls behind, lagged messages are skipped and the client
//! resumes from the most recent event.
//!
//! [`EngineEvent`]: trailwear_types::EngineEvent

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use trailwear_types::ControlSignal;

use crate::control::deliver;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming engine events.
///
/// # Route
///
/// `GET /ws/events`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut rx = state.subscribe();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!(kind = event.kind(), "Failed to serialize engine event: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Event channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        handle_client_text(&state, text.as_str());
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Relay a client text frame to the driver if it parses as a signal.
fn handle_client_text(state: &AppState, text: &str) {
    match serde_json::from_str::<ControlSignal>(text.trim()) {
        Ok(signal) => {
            if let Err(e) = deliver(state, signal) {
                debug!(?signal, "Ignoring client signal: {e}");
            }
        }
        Err(e) => {
            debug!(text, "Ignoring unrecognised client message: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use trailwear_core::control::ControlState;

    use super::*;

    #[test]
    fn client_text_drives_control() {
        let control = Arc::new(ControlState::new(false));
        let state = AppState::with_control(Arc::clone(&control), 10);

        handle_client_text(&state, "\"start\"");
        assert!(control.is_started());

        handle_client_text(&state, "not json");
        assert!(!control.is_stop_requested());

        handle_client_text(&state, " \"stop\" ");
        assert!(control.is_stop_requested());
    }

    #[test]
    fn client_text_without_control_is_ignored() {
        let state = AppState::new();
        handle_client_text(&state, "\"advance\"");
    }
}
