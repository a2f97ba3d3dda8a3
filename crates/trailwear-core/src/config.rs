//! Configuration loading and typed config structures for the Trailwear simulation.
//!
//! The canonical configuration lives in `trailwear-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file (or none at all) yields a
//! runnable configuration. Without a `regions` section the `default`
//! region points at the bundled assets under `assets/default/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use trailwear_terrain::CostParams;
use trailwear_terrain::elevation::DEFAULT_GREYSCALE_TOLERANCE;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// `world.region` names a region missing from `regions`.
    #[error("region {name:?} is not defined under `regions`")]
    UnknownRegion {
        /// The requested region name.
        name: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `trailwear-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, active region).
    #[serde(default)]
    pub world: WorldConfig,

    /// Named map regions, keyed by region name.
    #[serde(default = "default_regions")]
    pub regions: BTreeMap<String, RegionConfig>,

    /// Raster interpretation.
    #[serde(default)]
    pub terrain: TerrainConfig,

    /// Edge cost coefficients.
    #[serde(default)]
    pub cost: CostConfig,

    /// Search progress pacing.
    #[serde(default)]
    pub search: SearchConfig,

    /// Driver loop pacing and bounds.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Network settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            regions: default_regions(),
            terrain: TerrainConfig::default(),
            cost: CostConfig::default(),
            search: SearchConfig::default(),
            driver: DriverConfig::default(),
            infrastructure: InfrastructureConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `OBSERVER_PORT` in the environment overrides
    /// `infrastructure.observer_port`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }

    /// The region selected by `world.region`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRegion`] if it is not defined.
    pub fn active_region(&self) -> Result<&RegionConfig, ConfigError> {
        self.regions
            .get(&self.world.region)
            .ok_or_else(|| ConfigError::UnknownRegion {
                name: self.world.region.clone(),
            })
    }

    /// Cost parameters for the active region, applying its water cost
    /// override when present.
    pub fn cost_params(&self) -> CostParams {
        let mut params = self.cost.to_params();
        if let Some(water_cost) = self
            .regions
            .get(&self.world.region)
            .and_then(|r| r.water_cost)
        {
            params.water_cost = water_cost;
        }
        params
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducible endpoint selection.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Name of the entry in `regions` to load.
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            region: default_region(),
        }
    }
}

/// Geographic bounding box of a raster, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoBounds {
    /// Latitude of the top edge.
    pub north: f64,
    /// Latitude of the bottom edge.
    pub south: f64,
    /// Longitude of the left edge.
    pub west: f64,
    /// Longitude of the right edge.
    pub east: f64,
}

impl GeoBounds {
    /// Project `(lat, lon)` into fractional pixel coordinates on a
    /// `width` x `height` raster using an equirectangular mapping.
    ///
    /// Returns `None` for degenerate bounds.
    pub fn project(&self, lat: f64, lon: f64, width: u32, height: u32) -> Option<(f64, f64)> {
        let span_lon = self.east - self.west;
        let span_lat = self.north - self.south;
        if span_lon.abs() <= f64::EPSILON || span_lat.abs() <= f64::EPSILON {
            return None;
        }
        let x = (lon - self.west) / span_lon * f64::from(width);
        let y = (self.north - lat) / span_lat * f64::from(height);
        Some((x, y))
    }
}

/// Input files and bounds for one map region.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegionConfig {
    /// Path to the terrain raster image.
    pub raster: PathBuf,

    /// Path to the settlements JSON file.
    pub settlements: PathBuf,

    /// Geographic extent of the raster.
    pub bounds: GeoBounds,

    /// Region-specific override for `cost.water_cost`.
    #[serde(default)]
    pub water_cost: Option<f32>,
}

/// Raster interpretation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TerrainConfig {
    /// Maximum channel spread for a pixel to count as grey land.
    #[serde(default = "default_greyscale_tolerance")]
    pub greyscale_tolerance: u8,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            greyscale_tolerance: default_greyscale_tolerance(),
        }
    }
}

/// Edge cost coefficients. See [`CostParams`] for their meaning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CostConfig {
    /// Cost added per unit of elevation gained.
    #[serde(default = "default_uphill_factor")]
    pub uphill_factor: f32,

    /// Cost removed per unit of elevation lost.
    #[serde(default = "default_downhill_factor")]
    pub downhill_factor: f32,

    /// Floor for any land step before discounts.
    #[serde(default = "default_min_step_cost")]
    pub min_step_cost: f32,

    /// Flat cost of entering a water pixel.
    #[serde(default = "default_water_cost")]
    pub water_cost: f32,

    /// Fractional discount per recorded use of a pixel.
    #[serde(default = "default_usage_discount_per_use")]
    pub usage_discount_per_use: f32,

    /// Uses beyond this count give no further discount.
    #[serde(default = "default_usage_cap")]
    pub usage_cap: u16,

    /// Settlement proximity radius in grid steps.
    #[serde(default = "default_proximity_radius")]
    pub proximity_radius: f32,

    /// Multiplier applied to pixels within the proximity radius.
    #[serde(default = "default_proximity_discount")]
    pub proximity_discount: f32,

    /// Edge cost above which pruning may skip a relaxation.
    #[serde(default = "default_prune_cost_threshold")]
    pub prune_cost_threshold: f32,

    /// Relative slack for pruning.
    #[serde(default = "default_prune_tolerance")]
    pub prune_tolerance: f32,
}

impl CostConfig {
    /// Convert to the terrain crate's parameter struct.
    pub fn to_params(&self) -> CostParams {
        CostParams {
            uphill_factor: self.uphill_factor,
            downhill_factor: self.downhill_factor,
            min_step_cost: self.min_step_cost,
            water_cost: self.water_cost,
            usage_discount_per_use: self.usage_discount_per_use,
            usage_cap: self.usage_cap,
            proximity_discount: self.proximity_discount,
            prune_cost_threshold: self.prune_cost_threshold,
            prune_tolerance: self.prune_tolerance,
        }
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            uphill_factor: default_uphill_factor(),
            downhill_factor: default_downhill_factor(),
            min_step_cost: default_min_step_cost(),
            water_cost: default_water_cost(),
            usage_discount_per_use: default_usage_discount_per_use(),
            usage_cap: default_usage_cap(),
            proximity_radius: default_proximity_radius(),
            proximity_discount: default_proximity_discount(),
            prune_cost_threshold: default_prune_cost_threshold(),
            prune_tolerance: default_prune_tolerance(),
        }
    }
}

/// Search progress pacing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchConfig {
    /// Visited pixels in the first progress batch.
    #[serde(default = "default_initial_batch")]
    pub initial_batch: usize,

    /// Factor each successive batch grows by.
    #[serde(default = "default_batch_growth")]
    pub batch_growth: f64,

    /// Largest batch size.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,

    /// Progress batches between cooperative yields to the scheduler.
    #[serde(default = "default_yield_interval")]
    pub yield_interval: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            initial_batch: default_initial_batch(),
            batch_growth: default_batch_growth(),
            max_batch: default_max_batch(),
            yield_interval: default_yield_interval(),
        }
    }
}

/// Driver loop pacing and bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Minimum wall-clock gap between iterations.
    #[serde(default = "default_min_iteration_delay_ms")]
    pub min_iteration_delay_ms: u64,

    /// Pause after a search finds no path or selection is impossible.
    #[serde(default = "default_no_path_delay_ms")]
    pub no_path_delay_ms: u64,

    /// Stop after this many iterations (0 = unlimited).
    #[serde(default)]
    pub max_iterations: u64,

    /// Begin iterating without waiting for a `start` signal.
    #[serde(default = "default_true")]
    pub auto_start: bool,

    /// Wait for an `advance` signal after every emitted route.
    #[serde(default = "default_true")]
    pub await_consumer: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            min_iteration_delay_ms: default_min_iteration_delay_ms(),
            no_path_delay_ms: default_no_path_delay_ms(),
            max_iterations: 0,
            auto_start: true,
            await_consumer: true,
        }
    }
}

/// Network settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// Observer HTTP/WebSocket port.
    #[serde(default = "default_observer_port")]
    pub observer_port: u16,

    /// Route summaries the observer keeps for `/api/routes`.
    #[serde(default = "default_recent_routes")]
    pub recent_routes: usize,
}

impl InfrastructureConfig {
    /// Override settings with environment variables when set.
    ///
    /// An unparsable `OBSERVER_PORT` is ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("OBSERVER_PORT")
            .ok()
            .and_then(|val| val.parse().ok())
        {
            self.observer_port = port;
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            observer_port: default_observer_port(),
            recent_routes: default_recent_routes(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Trailwear".to_owned()
}

const fn default_seed() -> u64 {
    42
}

fn default_region() -> String {
    "default".to_owned()
}

fn default_regions() -> BTreeMap<String, RegionConfig> {
    let region = RegionConfig {
        raster: PathBuf::from("assets/default/terrain.png"),
        settlements: PathBuf::from("assets/default/settlements.json"),
        bounds: GeoBounds {
            north: 51.75,
            south: 51.25,
            west: -2.0,
            east: -1.0,
        },
        water_cost: None,
    };
    BTreeMap::from([(default_region(), region)])
}

const fn default_greyscale_tolerance() -> u8 {
    DEFAULT_GREYSCALE_TOLERANCE
}

const fn default_uphill_factor() -> f32 {
    0.25
}

const fn default_downhill_factor() -> f32 {
    0.05
}

const fn default_min_step_cost() -> f32 {
    0.2
}

const fn default_water_cost() -> f32 {
    8.0
}

const fn default_usage_discount_per_use() -> f32 {
    0.05
}

const fn default_usage_cap() -> u16 {
    12
}

const fn default_proximity_radius() -> f32 {
    20.0
}

const fn default_proximity_discount() -> f32 {
    0.7
}

const fn default_prune_cost_threshold() -> f32 {
    20.0
}

const fn default_prune_tolerance() -> f32 {
    0.05
}

const fn default_initial_batch() -> usize {
    64
}

const fn default_batch_growth() -> f64 {
    1.5
}

const fn default_max_batch() -> usize {
    8192
}

const fn default_yield_interval() -> u32 {
    1
}

const fn default_min_iteration_delay_ms() -> u64 {
    100
}

const fn default_no_path_delay_ms() -> u64 {
    500
}

const fn default_observer_port() -> u16 {
    8080
}

const fn default_recent_routes() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
