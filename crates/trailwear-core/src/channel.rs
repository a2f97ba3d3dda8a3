//! Outgoing event channel and progress batching.
//!
//! The driver never talks to a transport directly. It hands every
//! [`EngineEvent`] to an [`EventSink`], which may forward it to a tokio
//! channel, a broadcast hub, or a test buffer. Sinks receive owned copies;
//! nothing on the consumer side can reach back into engine state.

use tokio::sync::mpsc;
use tracing::warn;
use trailwear_types::EngineEvent;

use crate::config::SearchConfig;

/// Receiver of engine events, invoked from the driver task.
pub trait EventSink: Send {
    /// Deliver one event.
    fn emit(&mut self, event: EngineEvent);
}

/// Buffering sink, mostly useful in tests and batch tools.
impl EventSink for Vec<EngineEvent> {
    fn emit(&mut self, event: EngineEvent) {
        self.push(event);
    }
}

/// Forwards events into an unbounded tokio channel.
///
/// Once the receiver is dropped, further events are discarded and a single
/// warning is logged.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
    closed: bool,
}

impl ChannelSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, closed: false }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: EngineEvent) {
        if self.closed {
            return;
        }
        if self.tx.send(event).is_err() {
            warn!("Event receiver dropped, discarding further events");
            self.closed = true;
        }
    }
}

/// Adaptive size of search progress batches.
///
/// Starts small so a consumer sees exploration begin immediately, then
/// grows geometrically up to a ceiling so long searches are not drowned
/// in tiny messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBatcher {
    size: usize,
    growth: f64,
    max: usize,
}

impl ProgressBatcher {
    /// A batcher starting at `config.initial_batch`.
    ///
    /// Sizes are clamped to at least one pixel and growth to at least `1`.
    pub fn new(config: &SearchConfig) -> Self {
        let max = config.max_batch.max(1);
        let growth = if config.batch_growth.is_finite() {
            config.batch_growth.max(1.0)
        } else {
            1.0
        };
        Self {
            size: config.initial_batch.clamp(1, max),
            growth,
            max,
        }
    }

    /// Pixels to visit before the next progress event.
    pub const fn current(&self) -> usize {
        self.size
    }

    /// Grow the batch after a progress event was sent.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )] // bounded by `max` before the cast back
    pub fn advance(&mut self) {
        let grown = (self.size as f64 * self.growth).ceil();
        let max = self.max as f64;
        self.size = if grown >= max {
            self.max
        } else {
            (grown as usize).max(self.size)
        };
    }
}
