//! Control endpoints that relay consumer signals to the driver.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/control/start` | Let the driver begin iterating |
//! | `POST` | `/api/control/advance` | Consumer is ready for the next route |
//! | `POST` | `/api/control/stop` | Stop after the current search |
//! | `POST` | `/api/control/reset` | Clear route wear before the next iteration |
//! | `POST` | `/api/control` | Any signal as a JSON string body |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::info;
use trailwear_types::{ControlSignal, DriverPhase};

use crate::error::ObserverError;
use crate::state::AppState;

/// Response body for control endpoints.
#[derive(Debug, serde::Serialize)]
struct ControlResponse {
    /// Whether the signal was delivered.
    ok: bool,
    /// The signal that was applied.
    signal: ControlSignal,
    /// Driver phase observed right after delivery.
    phase: DriverPhase,
}

/// Deliver `signal` to the attached driver.
///
/// # Errors
///
/// Returns [`ObserverError::ControlUnavailable`] when no driver is
/// attached to this server.
pub fn deliver(state: &AppState, signal: ControlSignal) -> Result<DriverPhase, ObserverError> {
    let control = state
        .control
        .as_ref()
        .ok_or_else(|| ObserverError::ControlUnavailable("no driver attached".to_owned()))?;
    control.apply(signal);
    info!(?signal, "Control signal delivered");
    Ok(control.phase())
}

fn respond(
    state: &AppState,
    signal: ControlSignal,
) -> Result<Json<ControlResponse>, ObserverError> {
    let phase = deliver(state, signal)?;
    Ok(Json(ControlResponse {
        ok: true,
        signal,
        phase,
    }))
}

/// `POST /api/control/start`
pub async fn start(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    respond(&state, ControlSignal::Start)
}

/// `POST /api/control/advance`
pub async fn advance(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    respond(&state, ControlSignal::Advance)
}

/// `POST /api/control/stop`
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    respond(&state, ControlSignal::Stop)
}

/// `POST /api/control/reset`
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    respond(&state, ControlSignal::Reset)
}

/// `POST /api/control` with a body such as `"advance"`.
pub async fn signal(
    State(state): State<Arc<AppState>>,
    Json(signal): Json<ControlSignal>,
) -> Result<impl IntoResponse, ObserverError> {
    respond(&state, signal)
}
