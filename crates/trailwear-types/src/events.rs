//! Engine-to-consumer events and consumer-to-engine control signals.
//!
//! Events are a closed set of variants with typed payloads. On the wire
//! each event is `{"type": "<camelCaseName>", "payload": {...}}` so a
//! rendering client can dispatch on `type` without sniffing fields.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::settlement::Settlement;

/// A completed route handed to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RouteFound {
    /// Sequence number of the search that produced this route.
    pub search: u64,
    /// Pixel indices (`y * width + x`) from start to end, inclusive.
    pub path: Vec<u32>,
    /// Origin settlement.
    pub start: Settlement,
    /// Destination settlement.
    pub end: Settlement,
    /// Geometric path length divided by straight-line distance.
    pub efficiency: f64,
    /// Usage counter at each path pixel after reinforcement.
    pub usage: Vec<u16>,
}

impl RouteFound {
    /// Project this route into its lightweight summary.
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            search: self.search,
            start: self.start.name.clone(),
            end: self.end.name.clone(),
            efficiency: self.efficiency,
            pixels: u32::try_from(self.path.len()).unwrap_or(u32::MAX),
        }
    }
}

/// Compact record of a completed route, kept for leaderboards and status
/// queries after the full path has been discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RouteSummary {
    /// Sequence number of the search.
    pub search: u64,
    /// Origin settlement name.
    pub start: String,
    /// Destination settlement name.
    pub end: String,
    /// Efficiency ratio of the route.
    pub efficiency: f64,
    /// Number of pixels on the route.
    pub pixels: u32,
}

/// Messages flowing from the engine to the external consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum EngineEvent {
    /// Grid and settlements are loaded; the driver can be started.
    Ready {
        /// Every settlement known to the engine.
        settlements: Vec<Settlement>,
    },
    /// A new search is beginning.
    SearchStarted {
        /// Sequence number of the search.
        search: u64,
        /// Origin settlement name.
        start: String,
        /// Destination settlement name.
        end: String,
    },
    /// A batch of newly visited pixels.
    SearchProgress {
        /// Sequence number of the search.
        search: u64,
        /// Pixel indices visited since the previous batch.
        visited: Vec<u32>,
    },
    /// A search reached its target.
    PathFound(RouteFound),
    /// A search exhausted its frontier without reaching the target.
    NoPathFound {
        /// Sequence number of the search.
        search: u64,
        /// Origin settlement.
        start: Settlement,
        /// Destination settlement.
        end: Settlement,
    },
    /// Non-authoritative log line for display.
    Diagnostic {
        /// Human-readable text.
        message: String,
    },
}

impl EngineEvent {
    /// Short, stable name of the variant, matching the wire `type` tag.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::SearchStarted { .. } => "searchStarted",
            Self::SearchProgress { .. } => "searchProgress",
            Self::PathFound(_) => "pathFound",
            Self::NoPathFound { .. } => "noPathFound",
            Self::Diagnostic { .. } => "diagnostic",
        }
    }

    /// Build a diagnostic event.
    pub fn diagnostic(message: impl Into<String>) -> Self {
        Self::Diagnostic {
            message: message.into(),
        }
    }
}

/// Control signals flowing from the consumer to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ControlSignal {
    /// Leave `Idle` and begin the driver loop.
    Start,
    /// The consumer has finished with the previous result.
    Advance,
    /// Stop the driver after the current iteration.
    Stop,
    /// Clear all route wear before the next iteration and re-announce the
    /// settlements, as when the consumer switches theme.
    Reset,
}

/// Phase of the simulation driver's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum DriverPhase {
    /// Waiting for the start signal.
    #[default]
    Idle,
    /// Drawing an endpoint pair.
    Selecting,
    /// Running a shortest-path search.
    Searching,
    /// Handing a result to the event channel.
    Emitting,
    /// Waiting for the consumer's advance signal.
    AwaitingConsumer,
    /// The driver loop has exited.
    Stopped,
}
