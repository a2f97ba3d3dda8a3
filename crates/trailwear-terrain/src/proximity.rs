//! Distance-to-nearest-settlement field.
//!
//! Built once by a multi-source breadth-first expansion from every
//! settlement pixel. Orthogonal steps add `1`, diagonal steps add
//! `sqrt(2)`. A pixel keeps the first distance it is assigned, and the
//! expansion never assigns a distance beyond the radius, so the field is a
//! cheap bounded approximation rather than an exact metric. Its only job
//! is to let the route search ask "is this pixel near a city?" without a
//! nearest-neighbour query in the hot loop.

use std::collections::VecDeque;
use std::f32::consts::SQRT_2;

use tracing::debug;

use crate::grid::{Direction, Grid};

/// Sentinel for pixels farther than the radius from every settlement.
pub const FAR: f32 = f32::INFINITY;

/// Per-pixel bounded distance to the nearest settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityField {
    values: Vec<f32>,
    radius: f32,
}

impl ProximityField {
    /// Expand from `seeds` (flat pixel indices) out to `radius` steps.
    ///
    /// Seeds outside the grid are ignored.
    pub fn build(grid: &Grid, seeds: &[usize], radius: f32) -> Self {
        let mut values = vec![FAR; grid.len()];
        let mut frontier = VecDeque::with_capacity(seeds.len());

        for &seed in seeds {
            if let Some(slot) = values.get_mut(seed) {
                *slot = 0.0;
                frontier.push_back(seed);
            }
        }

        while let Some(current) = frontier.pop_front() {
            let Some(&here) = values.get(current) else {
                continue;
            };
            if here >= radius {
                continue;
            }
            for direction in Direction::ALL {
                let Some(next) = grid.neighbor(current, direction) else {
                    continue;
                };
                let Some(slot) = values.get_mut(next) else {
                    continue;
                };
                if slot.is_finite() {
                    continue;
                }
                let step = if direction.is_diagonal() { SQRT_2 } else { 1.0 };
                let candidate = here + step;
                if candidate <= radius {
                    *slot = candidate;
                    frontier.push_back(next);
                }
            }
        }

        let field = Self { values, radius };
        debug!(
            seeds = seeds.len(),
            radius,
            near_pixels = field.near_count(),
            "Proximity field built"
        );
        field
    }

    /// Distance at `index`, or [`FAR`].
    pub fn get(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(FAR)
    }

    /// Whether `index` lies within the radius of some settlement.
    pub fn is_near(&self, index: usize) -> bool {
        self.get(index) <= self.radius
    }

    /// The radius the field was built with.
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Number of pixels within the radius.
    pub fn near_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_zero_and_far_cells_keep_sentinel() {
        let grid = Grid::new(10, 1).unwrap();
        let field = ProximityField::build(&grid, &[0], 3.0);
        assert!(field.get(0).abs() < f32::EPSILON);
        assert!((field.get(1) - 1.0).abs() < f32::EPSILON);
        assert!((field.get(3) - 3.0).abs() < f32::EPSILON);
        assert!(field.get(4).is_infinite());
        assert!(field.is_near(3));
        assert!(!field.is_near(4));
        assert_eq!(field.near_count(), 4);
    }

    #[test]
    fn diagonal_steps_cost_sqrt_two() {
        let grid = Grid::new(5, 5).unwrap();
        let center = grid.index(2, 2).unwrap();
        let field = ProximityField::build(&grid, &[center], 5.0);
        let diag = grid.index(3, 3).unwrap();
        let orth = grid.index(3, 2).unwrap();
        assert!((field.get(diag) - SQRT_2).abs() < 1e-6);
        assert!((field.get(orth) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn multiple_sources_take_nearest() {
        let grid = Grid::new(9, 1).unwrap();
        let field = ProximityField::build(&grid, &[0, 8], 10.0);
        assert!((field.get(2) - 2.0).abs() < f32::EPSILON);
        assert!((field.get(6) - 2.0).abs() < f32::EPSILON);
        assert!((field.get(4) - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_bounds_seed_ignored() {
        let grid = Grid::new(3, 3).unwrap();
        let field = ProximityField::build(&grid, &[100], 2.0);
        assert_eq!(field.near_count(), 0);
        assert!(!field.is_near(100));
    }
}
