//! Shared type definitions for the Trailwear route simulation.
//!
//! This crate is the single source of truth for every value that crosses
//! the engine boundary. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the rendering client.
//!
//! # Modules
//!
//! - [`settlement`] -- Named population centers with pixel coordinates
//! - [`events`] -- Engine events, control signals, and driver phases

pub mod events;
pub mod settlement;

// Re-export all public types at crate root for convenience.
pub use events::{ControlSignal, DriverPhase, EngineEvent, RouteFound, RouteSummary};
pub use settlement::Settlement;

#[cfg(test)]
mod tests {
    //! Binding generation for the rendering client.

    #[test]
    fn export_bindings() {
        // ts-rs writes the `.ts` files into `bindings/` relative to the
        // crate root when `export_all` runs.
        use ts_rs::TS;

        let _ = crate::settlement::Settlement::export_all();
        let _ = crate::events::RouteFound::export_all();
        let _ = crate::events::RouteSummary::export_all();
        let _ = crate::events::EngineEvent::export_all();
        let _ = crate::events::ControlSignal::export_all();
        let _ = crate::events::DriverPhase::export_all();
    }
}
