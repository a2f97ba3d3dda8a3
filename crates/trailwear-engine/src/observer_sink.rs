//! Event sink that feeds the Observer API.
//!
//! Every event is broadcast to `WebSocket` clients. Events that change the
//! REST snapshot are also folded into it with `try_write` so the driver
//! never waits on a slow HTTP reader; if the lock is busy they queue and
//! are applied, in order, on the next emit that gets the lock.

use std::sync::Arc;

use tracing::debug;
use trailwear_core::channel::EventSink;
use trailwear_observer::state::AppState;
use trailwear_types::EngineEvent;

/// [`EventSink`] that bridges the driver to the Observer API.
pub struct ObserverSink {
    state: Arc<AppState>,
    pending: Vec<EngineEvent>,
}

impl ObserverSink {
    /// Create a sink backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            pending: Vec::new(),
        }
    }

    /// Number of events waiting for the snapshot lock.
    #[cfg(test)]
    const fn pending(&self) -> usize {
        self.pending.len()
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Ok(mut snap) = self.state.snapshot.try_write() {
            for event in self.pending.drain(..) {
                snap.apply(&event);
            }
        }
    }
}

impl EventSink for ObserverSink {
    fn emit(&mut self, event: EngineEvent) {
        if !matches!(event, EngineEvent::SearchProgress { .. }) {
            self.pending.push(event.clone());
        }
        let kind = event.kind();
        let receivers = self.state.broadcast(event);
        debug!(kind, receivers, "Engine event broadcast");
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use trailwear_types::Settlement;

    use super::*;

    fn ready() -> EngineEvent {
        EngineEvent::Ready {
            settlements: vec![Settlement::new("A", 1.0, 0, 0)],
        }
    }

    #[tokio::test]
    async fn events_reach_subscribers_and_snapshot() {
        let state = Arc::new(AppState::new());
        let mut rx = state.subscribe();
        let mut sink = ObserverSink::new(Arc::clone(&state));

        sink.emit(ready());
        sink.emit(EngineEvent::SearchProgress {
            search: 1,
            visited: vec![1, 2, 3],
        });

        assert!(matches!(rx.recv().await, Ok(EngineEvent::Ready { .. })));
        assert!(matches!(rx.recv().await, Ok(EngineEvent::SearchProgress { .. })));
        assert_eq!(state.snapshot.read().await.settlements.len(), 1);
        assert_eq!(sink.pending(), 0);
    }

    #[tokio::test]
    async fn busy_snapshot_defers_without_losing_events() {
        let state = Arc::new(AppState::new());
        let mut sink = ObserverSink::new(Arc::clone(&state));

        {
            let _reader = state.snapshot.read().await;
            sink.emit(ready());
            sink.emit(EngineEvent::diagnostic("busy"));
            assert_eq!(sink.pending(), 2);
        }

        sink.emit(EngineEvent::SearchProgress {
            search: 1,
            visited: Vec::new(),
        });
        assert_eq!(sink.pending(), 0);

        let snap = state.snapshot.read().await;
        assert_eq!(snap.settlements.len(), 1);
        assert_eq!(snap.last_diagnostic.as_deref(), Some("busy"));
    }
}
