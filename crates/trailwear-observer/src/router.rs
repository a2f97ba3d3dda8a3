//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST, control, and `WebSocket`) into a single
//! [`Router`] with CORS enabled so a browser renderer on another origin
//! can connect.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::control;
use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/events` -- `WebSocket` engine event stream
/// - `GET /api/status` -- driver phase and counters
/// - `GET /api/settlements` -- list settlements
/// - `GET /api/settlements/{name}` -- single settlement
/// - `GET /api/routes` -- recent routes
/// - `POST /api/control` and `POST /api/control/{start,advance,stop,reset}`
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/events", get(ws::ws_events))
        .route("/api/status", get(handlers::status))
        .route("/api/settlements", get(handlers::list_settlements))
        .route("/api/settlements/{name}", get(handlers::get_settlement))
        .route("/api/routes", get(handlers::list_routes))
        .route("/api/control", post(control::signal))
        .route("/api/control/start", post(control::start))
        .route("/api/control/advance", post(control::advance))
        .route("/api/control/stop", post(control::stop))
        .route("/api/control/reset", post(control::reset))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
