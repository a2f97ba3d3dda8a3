//! Engine binary for the Trailwear simulation.
//!
//! Loads configuration and the active region, builds the [`Engine`],
//! starts the Observer API, and runs the driver loop until it is stopped
//! or reaches its iteration limit.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `trailwear-config.yaml` (or the path given
//!    as the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Decode the region raster and project its settlements
//! 4. Build the engine
//! 5. Create control state and start the Observer API server
//! 6. Run the driver loop
//! 7. Log the result
//!
//! [`Engine`]: trailwear_core::engine::Engine

mod error;
mod loader;
mod observer_sink;

use std::path::PathBuf;
use std::sync::Arc;

use trailwear_core::config::{LoggingConfig, SimulationConfig};
use trailwear_core::control::ControlState;
use trailwear_core::engine::Engine;
use trailwear_core::runner::{self, RunnerConfig};
use trailwear_observer::startup::spawn_observer;
use trailwear_observer::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::observer_sink::ObserverSink;

/// Default configuration file, relative to the working directory.
const CONFIG_PATH: &str = "trailwear-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the driver fails.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_PATH), PathBuf::from);
    let found = config_path.exists();
    let config = if found {
        SimulationConfig::from_file(&config_path)?
    } else {
        let mut config = SimulationConfig::default();
        config.infrastructure.apply_env_overrides();
        config
    };

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("trailwear-engine starting");
    if found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        warn!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        region = config.world.region,
        observer_port = config.infrastructure.observer_port,
        "Simulation configured"
    );

    // 3. Load the active region.
    let region = config.active_region()?;
    let elevation = loader::load_elevation(&region.raster, config.terrain.greyscale_tolerance)?;
    let grid = *elevation.grid();
    let settlements =
        loader::load_settlements(&region.settlements, &region.bounds, grid.width(), grid.height())?;

    // 4. Build the engine.
    let mut engine = Engine::new(
        elevation,
        settlements,
        config.cost_params(),
        config.cost.proximity_radius,
        config.world.seed,
    )?;

    // 5. Control state and Observer API.
    let control = Arc::new(ControlState::new(config.driver.auto_start));
    let app_state = Arc::new(AppState::with_control(
        Arc::clone(&control),
        config.infrastructure.recent_routes,
    ));
    let observer_handle =
        spawn_observer(config.infrastructure.observer_port, Arc::clone(&app_state)).await?;

    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, stopping after the current search");
                control.request_stop();
            }
        });
    }

    // 6. Run the driver.
    let runner_config = RunnerConfig {
        search: config.search.clone(),
        driver: config.driver.clone(),
    };
    let mut sink = ObserverSink::new(app_state);
    let result = runner::run_simulation(&mut engine, &runner_config, &control, &mut sink).await?;

    // 7. Log results.
    runner::log_simulation_end(&result);
    observer_handle.abort();

    info!(
        end_reason = ?result.end_reason,
        iterations = result.iterations,
        "trailwear-engine shutdown complete"
    );

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
