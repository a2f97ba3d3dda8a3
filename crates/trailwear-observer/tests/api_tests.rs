//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use trailwear_core::control::ControlState;
use trailwear_observer::router::build_router;
use trailwear_observer::state::AppState;
use trailwear_types::{DriverPhase, EngineEvent, RouteFound, Settlement};

fn settlements() -> Vec<Settlement> {
    vec![
        Settlement::new("Ashford", 1200.0, 3, 4),
        Settlement::new("Brookmere", 800.0, 40, 12),
        Settlement::new("Calder", 300.0, 22, 30),
    ]
}

fn route(search: u64, start: &Settlement, end: &Settlement, efficiency: f64) -> EngineEvent {
    EngineEvent::PathFound(RouteFound {
        search,
        path: vec![0, 1, 2, 3],
        start: start.clone(),
        end: end.clone(),
        efficiency,
        usage: vec![1, 2, 2, 1],
    })
}

async fn make_test_state(control: Option<Arc<ControlState>>) -> Arc<AppState> {
    let state = match control {
        Some(c) => AppState::with_control(c, 10),
        None => AppState::new(),
    };
    let towns = settlements();
    {
        let mut snap = state.snapshot.write().await;
        snap.apply(&EngineEvent::Ready {
            settlements: towns.clone(),
        });
        for (search, (a, b)) in [(0, 1), (1, 2), (2, 0)].into_iter().enumerate() {
            let search = u64::try_from(search).unwrap() + 1;
            snap.apply(&EngineEvent::SearchStarted {
                search,
                start: towns[a].name.clone(),
                end: towns[b].name.clone(),
            });
            snap.apply(&route(search, &towns[a], &towns[b], 1.1));
        }
        snap.apply(&EngineEvent::NoPathFound {
            search: 4,
            start: towns[0].clone(),
            end: towns[2].clone(),
        });
    }
    Arc::new(state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

// ---------------------------------------------------------------------------
// Read endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_index_returns_html() {
    let router = build_router(make_test_state(None).await);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_status_counts_events() {
    let router = build_router(make_test_state(None).await);

    let response = router
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["phase"], "idle");
    assert_eq!(json["control_attached"], false);
    assert_eq!(json["settlements"], 3);
    assert_eq!(json["searches"], 3);
    assert_eq!(json["routes_found"], 3);
    assert_eq!(json["no_path"], 1);
    assert_eq!(json["current_search"], 3);
}

#[tokio::test]
async fn test_list_settlements() {
    let router = build_router(make_test_state(None).await);

    let response = router
        .oneshot(Request::get("/api/settlements").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 3);
    assert_eq!(json["settlements"][0]["name"], "Ashford");
}

#[tokio::test]
async fn test_get_settlement_by_name() {
    let router = build_router(make_test_state(None).await);

    let response = router
        .oneshot(
            Request::get("/api/settlements/Calder")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["settlement"]["x"], 22);
    assert_eq!(json["settlement"]["y"], 30);
}

#[tokio::test]
async fn test_get_settlement_not_found() {
    let router = build_router(make_test_state(None).await);

    let response = router
        .oneshot(
            Request::get("/api/settlements/Nowhere")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_list_routes_newest_first() {
    let router = build_router(make_test_state(None).await);

    let response = router
        .oneshot(Request::get("/api/routes").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 3);
    assert_eq!(json["total_found"], 3);
    assert_eq!(json["routes"][0]["search"], 3);
    assert_eq!(json["routes"][0]["start"], "Calder");
    assert_eq!(json["routes"][0]["pixels"], 4);
}

#[tokio::test]
async fn test_list_routes_with_limit() {
    let router = build_router(make_test_state(None).await);

    let response = router
        .oneshot(
            Request::get("/api/routes?limit=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn test_list_routes_zero_limit_rejected() {
    let router = build_router(make_test_state(None).await);

    let response = router
        .oneshot(
            Request::get("/api/routes?limit=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Control endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_control_without_driver_is_unavailable() {
    let router = build_router(make_test_state(None).await);

    let response = router.oneshot(post("/api/control/advance")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_control_start_and_stop() {
    let control = Arc::new(ControlState::new(false));
    let state = make_test_state(Some(Arc::clone(&control))).await;

    let response = build_router(Arc::clone(&state))
        .oneshot(post("/api/control/start"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["signal"], "start");
    assert!(control.is_started());

    let response = build_router(state)
        .oneshot(post("/api/control/stop"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(control.is_stop_requested());
}

#[tokio::test]
async fn test_control_reset() {
    let control = Arc::new(ControlState::new(false));
    let state = make_test_state(Some(Arc::clone(&control))).await;

    let response = build_router(state)
        .oneshot(post("/api/control/reset"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["signal"], "reset");
    assert!(control.take_reset());
    assert!(!control.take_reset());
}

#[tokio::test]
async fn test_control_signal_body() {
    let control = Arc::new(ControlState::new(false));
    let state = make_test_state(Some(Arc::clone(&control))).await;

    let response = build_router(state)
        .oneshot(
            Request::post("/api/control")
                .header("content-type", "application/json")
                .body(Body::from("\"start\""))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(control.is_started());
}

#[tokio::test]
async fn test_status_reports_driver_phase() {
    let control = Arc::new(ControlState::new(true));
    control.set_phase(DriverPhase::AwaitingConsumer);
    let state = make_test_state(Some(Arc::clone(&control))).await;

    let response = build_router(state)
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["phase"], "awaitingConsumer");
    assert_eq!(json["control_attached"], true);
    assert_eq!(json["started"], true);
}
