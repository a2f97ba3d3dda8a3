//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read from the in-memory [`ObserverSnapshot`] via the
//! shared [`AppState`]; none of them touch engine state.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Driver phase and counters |
//! | `GET` | `/api/settlements` | List all settlements |
//! | `GET` | `/api/settlements/:name` | Single settlement |
//! | `GET` | `/api/routes` | Recent route summaries (newest first) |
//!
//! [`ObserverSnapshot`]: crate::state::ObserverSnapshot

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use trailwear_types::DriverPhase;

use crate::error::ObserverError;
use crate::state::AppState;

/// Query parameters for the `GET /api/routes` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct RoutesQuery {
    /// Maximum number of routes to return (default: all retained).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing driver status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let phase = current_phase(&state);
    let snapshot = state.snapshot.read().await;
    let settlements = snapshot.settlements.len();
    let searches = snapshot.searches;
    let routes = snapshot.routes_found;
    let no_path = snapshot.no_path;
    let best = snapshot
        .recent_routes
        .iter()
        .map(|r| r.efficiency)
        .min_by(f64::total_cmp)
        .map_or_else(|| "-".to_owned(), |e| format!("{e:.3}"));

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Trailwear Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Trailwear Observer</h1>
    <p class="subtitle">Route wear simulation monitor</p>

    <div>
        <div class="metric"><div class="label">Phase</div><div class="value">{phase:?}</div></div>
        <div class="metric"><div class="label">Settlements</div><div class="value">{settlements}</div></div>
        <div class="metric"><div class="label">Searches</div><div class="value">{searches}</div></div>
        <div class="metric"><div class="label">Routes</div><div class="value">{routes}</div></div>
        <div class="metric"><div class="label">No path</div><div class="value">{no_path}</div></div>
        <div class="metric"><div class="label">Best efficiency</div><div class="value">{best}</div></div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/status">/api/status</a> -- Driver phase and counters</li>
        <li>GET <a href="/api/settlements">/api/settlements</a> -- Settlement list</li>
        <li>GET <a href="/api/routes">/api/routes</a> -- Recent routes</li>
        <li>POST /api/control/start | advance | stop | reset -- Driver control</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li><code>ws://host:port/ws/events</code> -- Live engine event stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return the driver phase, control flags, and event counters.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let phase = current_phase(&state);
    let (started, stop_requested) = state
        .control
        .as_ref()
        .map_or((false, false), |c| (c.is_started(), c.is_stop_requested()));
    let snapshot = state.snapshot.read().await;

    Json(serde_json::json!({
        "phase": phase,
        "control_attached": state.control.is_some(),
        "started": started,
        "stop_requested": stop_requested,
        "settlements": snapshot.settlements.len(),
        "searches": snapshot.searches,
        "routes_found": snapshot.routes_found,
        "no_path": snapshot.no_path,
        "current_search": snapshot.current_search,
        "last_diagnostic": snapshot.last_diagnostic,
        "subscribers": state.tx.receiver_count(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/settlements
// ---------------------------------------------------------------------------

/// List every settlement announced by the engine.
pub async fn list_settlements(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    Json(serde_json::json!({
        "count": snapshot.settlements.len(),
        "settlements": snapshot.settlements,
    }))
}

/// Return a single settlement by name.
pub async fn get_settlement(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.snapshot.read().await;
    let settlement = snapshot
        .settlement(&name)
        .ok_or_else(|| ObserverError::NotFound(format!("settlement {name}")))?;
    Ok(Json(serde_json::json!({ "settlement": settlement })))
}

// ---------------------------------------------------------------------------
// GET /api/routes
// ---------------------------------------------------------------------------

/// List recent route summaries, newest first.
///
/// # Query Parameters
///
/// - `limit`: Maximum number of routes to return (must be positive).
pub async fn list_routes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoutesQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    if params.limit == Some(0) {
        return Err(ObserverError::InvalidQuery(
            "limit must be at least 1".to_owned(),
        ));
    }
    let snapshot = state.snapshot.read().await;
    let limit = params.limit.unwrap_or(usize::MAX);
    let routes: Vec<_> = snapshot.recent_routes.iter().take(limit).collect();

    Ok(Json(serde_json::json!({
        "count": routes.len(),
        "total_found": snapshot.routes_found,
        "routes": routes,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn current_phase(state: &AppState) -> DriverPhase {
    state
        .control
        .as_ref()
        .map_or_else(DriverPhase::default, |c| c.phase())
}
