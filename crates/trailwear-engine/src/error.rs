//! Error types for the engine binary.
//!
//! [`AppError`] wraps every failure mode during startup and the driver
//! run so `main` can propagate with `?`.

use crate::loader::LoadError;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: trailwear_core::config::ConfigError,
    },

    /// Raster or settlement loading failed.
    #[error("load error: {source}")]
    Load {
        /// The underlying load error.
        #[from]
        source: LoadError,
    },

    /// The engine rejected the loaded terrain or settlements.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: trailwear_core::engine::EngineError,
    },

    /// The driver loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: trailwear_core::runner::RunnerError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: trailwear_observer::startup::StartupError,
    },
}
