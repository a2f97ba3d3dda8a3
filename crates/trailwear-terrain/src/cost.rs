//! Edge cost model for moving between adjacent pixels.
//!
//! The cost of stepping from `u` into neighbour `v` is built in four
//! multiplicative stages:
//!
//! 1. **Terrain.** Water costs a flat `water_cost`. Land costs
//!    `1 + uphill_factor * rise` going up, or
//!    `max(min_step_cost, 1 + downhill_factor * rise)` going down or level
//!    (`rise <= 0`, so this is a discount). Stepping out of water onto land
//!    counts as level ground.
//! 2. **Wear.** Pixels crossed by earlier routes get
//!    `1 - min(usage, usage_cap) * usage_discount_per_use`.
//! 3. **Proximity.** Pixels within the settlement radius get
//!    `proximity_discount`.
//! 4. **Geometry.** Diagonal moves are scaled by `sqrt(2)`.
//!
//! Impassable pixels have no edge at all.
//!
//! # Pruning
//!
//! [`CostParams::should_prune`] implements a deliberate approximation: an
//! edge dearer than `prune_cost_threshold` is not relaxed when its target
//! already holds a distance within `prune_tolerance` (relative) of the new
//! candidate. This keeps the search from churning through expensive
//! terrain at the price of occasionally missing a marginally cheaper route.
//! Setting `prune_cost_threshold` to infinity disables it.

use std::f32::consts::SQRT_2;

use crate::elevation::{is_impassable, is_water};
use crate::error::TerrainError;
use crate::grid::Direction;
use crate::terrain::Terrain;

/// Tunable coefficients of the edge cost model.
#[derive(Debug, Clone, PartialEq)]
pub struct CostParams {
    /// Cost added per unit of elevation gained.
    pub uphill_factor: f32,
    /// Cost removed per unit of elevation lost. Smaller than
    /// `uphill_factor`.
    pub downhill_factor: f32,
    /// Floor for any land step before discounts.
    pub min_step_cost: f32,
    /// Flat cost of entering a water pixel.
    pub water_cost: f32,
    /// Fractional discount per recorded use of a pixel.
    pub usage_discount_per_use: f32,
    /// Uses beyond this count give no further discount.
    pub usage_cap: u16,
    /// Multiplier applied to pixels near a settlement.
    pub proximity_discount: f32,
    /// Edge cost above which pruning may skip a relaxation.
    pub prune_cost_threshold: f32,
    /// Relative slack for pruning (`0.05` = within 5%).
    pub prune_tolerance: f32,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            uphill_factor: 0.25,
            downhill_factor: 0.05,
            min_step_cost: 0.2,
            water_cost: 8.0,
            usage_discount_per_use: 0.05,
            usage_cap: 12,
            proximity_discount: 0.7,
            prune_cost_threshold: 20.0,
            prune_tolerance: 0.05,
        }
    }
}

impl CostParams {
    /// Check that every coefficient keeps edge costs finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidCost`] describing the first bad
    /// parameter.
    pub fn validate(&self) -> Result<(), TerrainError> {
        let positive = [
            ("uphill_factor", self.uphill_factor),
            ("min_step_cost", self.min_step_cost),
            ("water_cost", self.water_cost),
            ("proximity_discount", self.proximity_discount),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TerrainError::InvalidCost(format!(
                    "{name} must be finite and positive (got {value})"
                )));
            }
        }
        if !(self.downhill_factor >= 0.0 && self.downhill_factor < self.uphill_factor) {
            return Err(TerrainError::InvalidCost(format!(
                "downhill_factor must be in [0, uphill_factor) (got {})",
                self.downhill_factor
            )));
        }
        if self.proximity_discount > 1.0 {
            return Err(TerrainError::InvalidCost(format!(
                "proximity_discount must not exceed 1 (got {})",
                self.proximity_discount
            )));
        }
        let max_discount = self.usage_discount_per_use * f32::from(self.usage_cap);
        if !(self.usage_discount_per_use >= 0.0 && max_discount < 1.0) {
            return Err(TerrainError::InvalidCost(format!(
                "usage_discount_per_use * usage_cap must be in [0, 1) (got {max_discount})"
            )));
        }
        if !(self.prune_tolerance >= 0.0) || self.prune_cost_threshold.is_nan() {
            return Err(TerrainError::InvalidCost(String::from(
                "prune_tolerance must be non-negative and prune_cost_threshold a number",
            )));
        }
        Ok(())
    }

    /// Terrain cost of a land step with the given elevation change.
    pub fn slope_cost(&self, rise: f32) -> f32 {
        if rise > 0.0 {
            self.uphill_factor.mul_add(rise, 1.0)
        } else {
            self.downhill_factor.mul_add(rise, 1.0).max(self.min_step_cost)
        }
    }

    /// Multiplier for a pixel that has been crossed `usage` times.
    pub fn usage_multiplier(&self, usage: u16) -> f32 {
        if usage == 0 {
            return 1.0;
        }
        let uses = f32::from(usage.min(self.usage_cap));
        (-uses).mul_add(self.usage_discount_per_use, 1.0)
    }

    /// Cost of stepping from `from` into its neighbour `to` along
    /// `direction`, or `None` if `to` is impassable.
    pub fn edge_cost(
        &self,
        terrain: &Terrain,
        from: usize,
        to: usize,
        direction: Direction,
    ) -> Option<f32> {
        let elevation = terrain.elevation();
        let target = elevation.get(to)?;
        if is_impassable(target) {
            return None;
        }

        let base = if is_water(target) {
            self.water_cost
        } else {
            let source = elevation.get(from)?;
            let rise = if is_water(source) || is_impassable(source) {
                0.0
            } else {
                target - source
            };
            self.slope_cost(rise)
        };

        let mut cost = base * self.usage_multiplier(terrain.usage().get(to));
        if terrain.proximity().is_near(to) {
            cost *= self.proximity_discount;
        }
        if direction.is_diagonal() {
            cost *= SQRT_2;
        }
        Some(cost)
    }

    /// Whether an edge of cost `edge` into a pixel already holding
    /// `existing` should be skipped instead of relaxed to `candidate`.
    pub fn should_prune(&self, edge: f32, existing: f32, candidate: f32) -> bool {
        edge > self.prune_cost_threshold
            && existing.is_finite()
            && existing <= candidate * (1.0 + self.prune_tolerance)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::elevation::{ElevationField, IMPASSABLE, WATER};
    use crate::grid::Grid;

    fn terrain(values: Vec<f32>, width: u32, height: u32, seeds: &[usize], radius: f32) -> Terrain {
        let grid = Grid::new(width, height).unwrap();
        let elevation = ElevationField::from_values(grid, values).unwrap();
        Terrain::new(elevation, seeds, radius)
    }

    #[test]
    fn default_params_are_valid() {
        assert!(CostParams::default().validate().is_ok());
    }

    #[test]
    fn invalid_params_rejected() {
        let params = CostParams {
            downhill_factor: 1.0,
            uphill_factor: 0.5,
            ..CostParams::default()
        };
        assert!(params.validate().is_err());

        let params = CostParams {
            usage_discount_per_use: 0.1,
            usage_cap: 10,
            ..CostParams::default()
        };
        assert!(params.validate().is_err());

        let params = CostParams {
            water_cost: 0.0,
            ..CostParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn uphill_costs_more_than_downhill() {
        let params = CostParams::default();
        let up = params.slope_cost(10.0);
        let flat = params.slope_cost(0.0);
        let down = params.slope_cost(-10.0);
        assert!(up > flat);
        assert!(down < flat);
        assert!((flat - 1.0).abs() < f32::EPSILON);
        // Steep descents bottom out at the floor.
        assert!((params.slope_cost(-1000.0) - params.min_step_cost).abs() < f32::EPSILON);
    }

    #[test]
    fn usage_discount_is_monotone_and_capped() {
        let params = CostParams::default();
        let mut previous = params.usage_multiplier(0);
        for uses in 1..=params.usage_cap {
            let current = params.usage_multiplier(uses);
            assert!(current <= previous);
            previous = current;
        }
        let at_cap = params.usage_multiplier(params.usage_cap);
        let beyond = params.usage_multiplier(params.usage_cap.saturating_add(5));
        assert!((at_cap - beyond).abs() < f32::EPSILON);
        assert!(at_cap > 0.0);
    }

    #[test]
    fn edge_cost_into_worn_pixel_never_increases() {
        let params = CostParams::default();
        let mut t = terrain(vec![10.0, 10.0], 2, 1, &[], 0.0);
        let mut previous = params.edge_cost(&t, 0, 1, Direction::East).unwrap();
        for _ in 0..20 {
            let _ = t.reinforce(&[1]);
            let current = params.edge_cost(&t, 0, 1, Direction::East).unwrap();
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn water_and_impassable() {
        let params = CostParams::default();
        let t = terrain(vec![10.0, WATER, IMPASSABLE, 50.0], 4, 1, &[], 0.0);
        let into_water = params.edge_cost(&t, 0, 1, Direction::East).unwrap();
        assert!((into_water - params.water_cost).abs() < f32::EPSILON);
        assert!(params.edge_cost(&t, 1, 2, Direction::East).is_none());
        // Leaving water is level ground regardless of the land height.
        let ashore = params.edge_cost(&t, 1, 0, Direction::West).unwrap();
        assert!((ashore - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn proximity_never_makes_entry_dearer() {
        let params = CostParams::default();
        // Pixel 1 is within radius of the seed at 0; pixel 4 is not.
        let t = terrain(vec![5.0; 6], 6, 1, &[0], 1.5);
        let near = params.edge_cost(&t, 2, 1, Direction::West).unwrap();
        let far = params.edge_cost(&t, 3, 4, Direction::East).unwrap();
        assert!(near <= far);
        assert!(near < far);
    }

    #[test]
    fn diagonal_scaled_by_sqrt_two() {
        let params = CostParams::default();
        let t = terrain(vec![0.0; 4], 2, 2, &[], 0.0);
        let orth = params.edge_cost(&t, 0, 1, Direction::East).unwrap();
        let diag = params.edge_cost(&t, 0, 3, Direction::SouthEast).unwrap();
        assert!((diag - orth * SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn pruning_only_applies_to_expensive_edges() {
        let params = CostParams::default();
        // Cheap edge: never pruned.
        assert!(!params.should_prune(1.0, 10.0, 9.0));
        // Expensive edge, existing within tolerance of candidate: pruned.
        assert!(params.should_prune(50.0, 10.2, 10.0));
        // Expensive edge, existing much worse: relaxed.
        assert!(!params.should_prune(50.0, 30.0, 10.0));
        // Expensive edge, nothing known yet: relaxed.
        assert!(!params.should_prune(50.0, f32::INFINITY, 10.0));
    }
}
