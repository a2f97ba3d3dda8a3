//! Terrain fields and route search for the Trailwear simulation.
//!
//! This crate models the ground routes are walked over: a rectangular
//! pixel grid carrying an elevation proxy, a bounded distance-to-settlement
//! field, and per-pixel wear counters, plus the resumable least-cost search
//! that reads them.
//!
//! # Modules
//!
//! - [`grid`] -- Grid dimensions, flat indexing, and the eight step
//!   directions.
//! - [`elevation`] -- [`ElevationField`] built from an RGB raster, with
//!   water and impassable sentinels.
//! - [`proximity`] -- [`ProximityField`], a multi-source breadth-first
//!   distance to the nearest settlement.
//! - [`usage`] -- [`UsageField`] wear counters and reinforcement.
//! - [`cost`] -- [`CostParams`], the edge cost model and its pruning rule.
//! - [`terrain`] -- [`Terrain`], the three fields over one grid.
//! - [`search`] -- [`Search`], a resumable Dijkstra that reports visited
//!   pixels in batches.
//! - [`error`] -- Error types for construction and indexing.

pub mod cost;
pub mod elevation;
pub mod error;
pub mod grid;
pub mod proximity;
pub mod search;
pub mod terrain;
pub mod usage;

pub use cost::CostParams;
pub use elevation::{ElevationField, IMPASSABLE, WATER};
pub use error::TerrainError;
pub use grid::{Direction, Grid};
pub use proximity::ProximityField;
pub use search::{PathResult, Search, SearchOutcome};
pub use terrain::Terrain;
pub use usage::UsageField;
