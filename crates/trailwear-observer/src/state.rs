//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel that fans engine events out to
//! `WebSocket` clients, an in-memory [`ObserverSnapshot`] that the REST
//! endpoints serve, and (when a driver is running) the shared
//! [`ControlState`] that control endpoints write to.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use trailwear_core::control::ControlState;
use trailwear_types::{EngineEvent, RouteSummary, Settlement};

/// Capacity of the broadcast channel for engine events.
///
/// Progress batches are frequent, so this is generous. A subscriber that
/// falls further behind receives [`broadcast::error::RecvError::Lagged`]
/// and skips to the newest event.
const BROADCAST_CAPACITY: usize = 4096;

/// Default number of route summaries kept for `/api/routes`.
pub const DEFAULT_RECENT_ROUTES: usize = 50;

/// In-memory view of the simulation served by REST endpoints.
///
/// Built entirely from the event stream via [`ObserverSnapshot::apply`],
/// so the observer never touches engine state.
#[derive(Debug, Clone)]
pub struct ObserverSnapshot {
    /// Settlements announced by the last `ready` event.
    pub settlements: Vec<Settlement>,
    /// Most recent route summaries, newest first.
    pub recent_routes: VecDeque<RouteSummary>,
    /// Maximum length of `recent_routes`.
    pub route_capacity: usize,
    /// Searches started.
    pub searches: u64,
    /// Searches that found a route.
    pub routes_found: u64,
    /// Searches that found no route.
    pub no_path: u64,
    /// Sequence number of the search currently running or last run.
    pub current_search: Option<u64>,
    /// Text of the latest diagnostic event.
    pub last_diagnostic: Option<String>,
}

impl ObserverSnapshot {
    /// An empty snapshot keeping up to `route_capacity` route summaries.
    pub fn new(route_capacity: usize) -> Self {
        Self {
            settlements: Vec::new(),
            recent_routes: VecDeque::with_capacity(route_capacity),
            route_capacity,
            searches: 0,
            routes_found: 0,
            no_path: 0,
            current_search: None,
            last_diagnostic: None,
        }
    }

    /// Fold one engine event into the snapshot.
    pub fn apply(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Ready { settlements } => {
                self.settlements.clone_from(settlements);
            }
            EngineEvent::SearchStarted { search, .. } => {
                self.searches = self.searches.saturating_add(1);
                self.current_search = Some(*search);
            }
            EngineEvent::SearchProgress { .. } => {}
            EngineEvent::PathFound(route) => {
                self.routes_found = self.routes_found.saturating_add(1);
                if self.route_capacity > 0 {
                    if self.recent_routes.len() >= self.route_capacity {
                        self.recent_routes.pop_back();
                    }
                    self.recent_routes.push_front(route.summary());
                }
            }
            EngineEvent::NoPathFound { .. } => {
                self.no_path = self.no_path.saturating_add(1);
            }
            EngineEvent::Diagnostic { message } => {
                self.last_diagnostic = Some(message.clone());
            }
        }
    }

    /// Look up a settlement by exact name.
    pub fn settlement(&self, name: &str) -> Option<&Settlement> {
        self.settlements.iter().find(|s| s.name == name)
    }
}

impl Default for ObserverSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_ROUTES)
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Broadcast sender for engine events.
    pub tx: broadcast::Sender<EngineEvent>,
    /// The current snapshot, updated as events are published.
    pub snapshot: Arc<RwLock<ObserverSnapshot>>,
    /// Shared driver control state (present when a driver is running).
    pub control: Option<Arc<ControlState>>,
}

impl AppState {
    /// Create application state with an empty snapshot and no control.
    pub fn new() -> Self {
        Self::build(DEFAULT_RECENT_ROUTES, None)
    }

    /// Create application state wired to a running driver.
    pub fn with_control(control: Arc<ControlState>, recent_routes: usize) -> Self {
        Self::build(recent_routes, Some(control))
    }

    fn build(recent_routes: usize, control: Option<Arc<ControlState>>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot: Arc::new(RwLock::new(ObserverSnapshot::new(recent_routes))),
            control,
        }
    }

    /// Subscribe to the engine event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all connected clients.
    ///
    /// Returns the number of receivers. Zero is normal when no
    /// `WebSocket` clients are connected.
    pub fn broadcast(&self, event: EngineEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use trailwear_types::RouteFound;

    use super::*;

    fn route(search: u64) -> EngineEvent {
        EngineEvent::PathFound(RouteFound {
            search,
            path: vec![0, 1, 2],
            start: Settlement::new("A", 10.0, 0, 0),
            end: Settlement::new("B", 20.0, 2, 0),
            efficiency: 1.0,
            usage: vec![1, 1, 1],
        })
    }

    #[test]
    fn counters_follow_events() {
        let mut snap = ObserverSnapshot::default();
        snap.apply(&EngineEvent::Ready {
            settlements: vec![Settlement::new("A", 10.0, 0, 0)],
        });
        snap.apply(&EngineEvent::SearchStarted {
            search: 1,
            start: "A".to_owned(),
            end: "B".to_owned(),
        });
        snap.apply(&route(1));
        snap.apply(&EngineEvent::NoPathFound {
            search: 2,
            start: Settlement::new("A", 10.0, 0, 0),
            end: Settlement::new("B", 20.0, 2, 0),
        });
        snap.apply(&EngineEvent::diagnostic("hello"));

        assert_eq!(snap.settlements.len(), 1);
        assert!(snap.settlement("A").is_some());
        assert_eq!(snap.searches, 1);
        assert_eq!(snap.current_search, Some(1));
        assert_eq!(snap.routes_found, 1);
        assert_eq!(snap.no_path, 1);
        assert_eq!(snap.last_diagnostic.as_deref(), Some("hello"));
    }

    #[test]
    fn recent_routes_are_capped_newest_first() {
        let mut snap = ObserverSnapshot::new(2);
        for search in 1..=3 {
            snap.apply(&route(search));
        }
        let order: Vec<u64> = snap.recent_routes.iter().map(|r| r.search).collect();
        assert_eq!(order, vec![3, 2]);
        assert_eq!(snap.routes_found, 3);
    }

    #[test]
    fn broadcast_without_subscribers_is_not_an_error() {
        let state = AppState::new();
        assert_eq!(state.broadcast(EngineEvent::diagnostic("nobody")), 0);
        let mut rx = state.subscribe();
        assert_eq!(state.broadcast(EngineEvent::diagnostic("someone")), 1);
        assert!(rx.try_recv().is_ok());
    }
}
