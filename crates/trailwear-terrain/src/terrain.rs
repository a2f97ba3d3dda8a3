//! The cost grid: elevation, proximity, and usage fields over one grid.

use tracing::debug;

use crate::cost::CostParams;
use crate::elevation::ElevationField;
use crate::error::TerrainError;
use crate::grid::Grid;
use crate::proximity::ProximityField;
use crate::search::Search;
use crate::usage::UsageField;

/// All per-pixel fields the route search reads.
///
/// Elevation and proximity are fixed at construction. Usage is the only
/// field that changes afterwards, through [`Terrain::reinforce`].
#[derive(Debug, Clone)]
pub struct Terrain {
    grid: Grid,
    elevation: ElevationField,
    proximity: ProximityField,
    usage: UsageField,
}

impl Terrain {
    /// Assemble a terrain from an elevation field and settlement pixels.
    ///
    /// Builds the proximity field out to `proximity_radius` and a zeroed
    /// usage field.
    pub fn new(
        elevation: ElevationField,
        settlement_pixels: &[usize],
        proximity_radius: f32,
    ) -> Self {
        let grid = *elevation.grid();
        let proximity = ProximityField::build(&grid, settlement_pixels, proximity_radius);
        let usage = UsageField::new(grid.len());
        debug!(
            width = grid.width(),
            height = grid.height(),
            settlements = settlement_pixels.len(),
            "Terrain assembled"
        );
        Self {
            grid,
            elevation,
            proximity,
            usage,
        }
    }

    /// Grid dimensions.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Elevation field.
    pub const fn elevation(&self) -> &ElevationField {
        &self.elevation
    }

    /// Proximity field.
    pub const fn proximity(&self) -> &ProximityField {
        &self.proximity
    }

    /// Usage field.
    pub const fn usage(&self) -> &UsageField {
        &self.usage
    }

    /// Apply reinforcement feedback for a completed path.
    ///
    /// Returns the post-increment usage at each path pixel.
    pub fn reinforce(&mut self, path: &[usize]) -> Vec<u16> {
        self.usage.reinforce(path)
    }

    /// Clear all accumulated wear.
    pub fn reset_usage(&mut self) {
        self.usage.reset();
    }

    /// Begin a route search from `start` to `goal`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::IndexOutOfBounds`] if either index lies
    /// outside the grid.
    pub fn search<'a>(
        &'a self,
        params: &'a CostParams,
        start: usize,
        goal: usize,
    ) -> Result<Search<'a>, TerrainError> {
        Search::new(self, params, start, goal)
    }
}
