//! Observer API server for the Trailwear simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/events`) streaming every engine event
//!   via [`tokio::sync::broadcast`], and accepting control signals back
//! - **REST endpoints** for the driver status, settlements, and recent
//!   routes
//! - **Control endpoints** (`/api/control/...`) for start, advance, and
//!   stop
//! - **Minimal HTML page** (`GET /`) with counters and API links
//!
//! # Architecture
//!
//! The observer never touches the engine. It folds the event stream into
//! an in-memory [`ObserverSnapshot`] and serves reads from that. Control
//! requests write to the shared [`ControlState`] the driver polls.
//!
//! [`ObserverSnapshot`]: state::ObserverSnapshot
//! [`ControlState`]: trailwear_core::control::ControlState

pub mod control;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use state::{AppState, ObserverSnapshot};
