//! The single owner of all grid state.
//!
//! [`Engine`] holds the terrain fields, the settlement list, the cost
//! parameters, and the seeded RNG used for endpoint selection. The driver
//! borrows it immutably for the duration of a search and mutably only to
//! apply reinforcement, so no search can ever observe a half-written usage
//! field.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};
use trailwear_terrain::{CostParams, ElevationField, Search, SearchOutcome, Terrain, TerrainError};
use trailwear_types::Settlement;

use crate::selection;

/// Errors raised while building or driving the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Terrain construction or indexing failed.
    #[error("terrain error: {source}")]
    Terrain {
        /// The underlying terrain error.
        #[from]
        source: TerrainError,
    },

    /// Two settlements share a name.
    #[error("duplicate settlement name {name:?}")]
    DuplicateSettlement {
        /// The repeated name.
        name: String,
    },

    /// A settlement lies outside the grid.
    #[error("settlement {name:?} at ({x}, {y}) is outside the {width}x{height} grid")]
    SettlementOutOfBounds {
        /// Settlement name.
        name: String,
        /// Pixel column.
        x: u32,
        /// Pixel row.
        y: u32,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },

    /// A settlement's population is zero, negative, or not a number.
    #[error("settlement {name:?} has non-positive population {population}")]
    InvalidPopulation {
        /// Settlement name.
        name: String,
        /// The rejected value.
        population: f64,
    },

    /// A search was requested but no settlements are loaded.
    #[error("no settlements are loaded")]
    NoSettlements,

    /// A settlement index or name did not resolve.
    #[error("unknown settlement {0}")]
    UnknownSettlement(String),
}

/// Terrain, settlements, and selection state for one simulation.
#[derive(Debug)]
pub struct Engine {
    terrain: Terrain,
    settlements: Vec<Settlement>,
    pixels: Vec<usize>,
    by_name: BTreeMap<String, usize>,
    params: CostParams,
    rng: StdRng,
}

impl Engine {
    /// Build an engine over `elevation` with the given settlements.
    ///
    /// # Errors
    ///
    /// Fails on invalid cost parameters, duplicate settlement names,
    /// settlements outside the grid, or non-positive populations.
    pub fn new(
        elevation: ElevationField,
        settlements: Vec<Settlement>,
        params: CostParams,
        proximity_radius: f32,
        seed: u64,
    ) -> Result<Self, EngineError> {
        params.validate()?;
        let grid = *elevation.grid();

        let mut by_name = BTreeMap::new();
        let mut pixels = Vec::with_capacity(settlements.len());
        for (i, s) in settlements.iter().enumerate() {
            if !(s.population.is_finite() && s.population > 0.0) {
                return Err(EngineError::InvalidPopulation {
                    name: s.name.clone(),
                    population: s.population,
                });
            }
            let Some(pixel) = grid.index(s.x, s.y) else {
                return Err(EngineError::SettlementOutOfBounds {
                    name: s.name.clone(),
                    x: s.x,
                    y: s.y,
                    width: grid.width(),
                    height: grid.height(),
                });
            };
            if by_name.insert(s.name.clone(), i).is_some() {
                return Err(EngineError::DuplicateSettlement {
                    name: s.name.clone(),
                });
            }
            pixels.push(pixel);
        }

        let terrain = Terrain::new(elevation, &pixels, proximity_radius);
        info!(
            width = grid.width(),
            height = grid.height(),
            settlements = settlements.len(),
            water_pixels = terrain.elevation().water_count(),
            near_pixels = terrain.proximity().near_count(),
            "Engine ready"
        );

        Ok(Self {
            terrain,
            settlements,
            pixels,
            by_name,
            params,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Loaded settlements in input order.
    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    /// The settlement at `index`.
    pub fn settlement(&self, index: usize) -> Option<&Settlement> {
        self.settlements.get(index)
    }

    /// Index of the settlement called `name`.
    pub fn settlement_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Current terrain fields.
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Active cost parameters.
    pub const fn params(&self) -> &CostParams {
        &self.params
    }

    /// Draw an ordered `(start, end)` settlement pair, or `None` when no
    /// valid pair exists.
    pub fn select_pair(&mut self) -> Option<(usize, usize)> {
        let start = selection::pick_start(&self.settlements, &mut self.rng)?;
        let end = selection::pick_end(&self.settlements, start, &mut self.rng)?;
        Some((start, end))
    }

    fn pixel_of(&self, settlement: usize) -> Result<usize, EngineError> {
        if self.settlements.is_empty() {
            return Err(EngineError::NoSettlements);
        }
        self.pixels
            .get(settlement)
            .copied()
            .ok_or_else(|| EngineError::UnknownSettlement(format!("#{settlement}")))
    }

    /// Begin a resumable search between two settlements.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoSettlements`] or
    /// [`EngineError::UnknownSettlement`].
    pub fn begin_search(&self, start: usize, end: usize) -> Result<Search<'_>, EngineError> {
        let from = self.pixel_of(start)?;
        let to = self.pixel_of(end)?;
        debug!(start, end, from, to, "Search starting");
        Ok(self.terrain.search(&self.params, from, to)?)
    }

    /// Run a search between two settlements to completion.
    ///
    /// # Errors
    ///
    /// See [`Engine::begin_search`].
    pub fn search(&self, start: usize, end: usize) -> Result<SearchOutcome, EngineError> {
        Ok(self.begin_search(start, end)?.finish())
    }

    /// Run a search between two settlements named `start` and `end`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSettlement`] for unknown names.
    pub fn search_by_name(&self, start: &str, end: &str) -> Result<SearchOutcome, EngineError> {
        let lookup = |name: &str| {
            self.settlement_index(name)
                .ok_or_else(|| EngineError::UnknownSettlement(name.to_owned()))
        };
        if self.settlements.is_empty() {
            return Err(EngineError::NoSettlements);
        }
        self.search(lookup(start)?, lookup(end)?)
    }

    /// Apply reinforcement for a completed path and return the usage
    /// values along it.
    pub fn reinforce(&mut self, path: &[usize]) -> Vec<u16> {
        self.terrain.reinforce(path)
    }

    /// Clear all accumulated wear, keeping terrain and settlements.
    pub fn reset_usage(&mut self) {
        self.terrain.reset_usage();
        info!("Usage field reset");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use trailwear_terrain::Grid;

    use super::*;

    fn flat(width: u32, height: u32) -> ElevationField {
        ElevationField::flat(Grid::new(width, height).unwrap(), 100.0)
    }

    fn towns() -> Vec<Settlement> {
        vec![
            Settlement::new("Ashford", 1000.0, 0, 0),
            Settlement::new("Brookmere", 500.0, 3, 3),
            Settlement::new("Coldwater", 250.0, 3, 0),
        ]
    }

    fn engine() -> Engine {
        Engine::new(flat(4, 4), towns(), CostParams::default(), 2.0, 7).unwrap()
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut list = towns();
        list.push(Settlement::new("Ashford", 10.0, 1, 1));
        let err = Engine::new(flat(4, 4), list, CostParams::default(), 2.0, 1).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateSettlement { name } if name == "Ashford"));
    }

    #[test]
    fn rejects_out_of_grid_settlement() {
        let list = vec![Settlement::new("Faraway", 10.0, 4, 0)];
        let err = Engine::new(flat(4, 4), list, CostParams::default(), 2.0, 1).unwrap_err();
        assert!(matches!(err, EngineError::SettlementOutOfBounds { x: 4, .. }));
    }

    #[test]
    fn rejects_non_positive_population() {
        for population in [0.0, -5.0, f64::NAN] {
            let list = vec![Settlement::new("Empty", population, 0, 0)];
            let err = Engine::new(flat(4, 4), list, CostParams::default(), 2.0, 1).unwrap_err();
            assert!(matches!(err, EngineError::InvalidPopulation { .. }));
        }
    }

    #[test]
    fn rejects_invalid_cost_params() {
        let params = CostParams {
            water_cost: -1.0,
            ..CostParams::default()
        };
        let err = Engine::new(flat(4, 4), towns(), params, 2.0, 1).unwrap_err();
        assert!(matches!(err, EngineError::Terrain { .. }));
    }

    #[test]
    fn search_without_settlements_fails() {
        let e = Engine::new(flat(4, 4), Vec::new(), CostParams::default(), 2.0, 1).unwrap();
        assert!(matches!(e.search(0, 1), Err(EngineError::NoSettlements)));
    }

    #[test]
    fn search_by_name_connects_corners() {
        let e = engine();
        let outcome = e.search_by_name("Ashford", "Brookmere").unwrap();
        assert!(matches!(
            outcome,
            SearchOutcome::Found(ref result) if result.path == [0, 5, 10, 15]
        ));
        assert!(matches!(
            e.search_by_name("Ashford", "Nowhere"),
            Err(EngineError::UnknownSettlement(_))
        ));
    }

    #[test]
    fn reinforce_then_reset() {
        let mut e = engine();
        let usage = e.reinforce(&[0, 5, 10, 15]);
        assert_eq!(usage, vec![1, 1, 1, 1]);
        assert_eq!(e.terrain().usage().worn_count(), 4);
        e.reset_usage();
        assert_eq!(e.terrain().usage().worn_count(), 0);
        // Terrain and settlements survive.
        assert_eq!(e.settlements().len(), 3);
    }

    #[test]
    fn pair_selection_is_seeded() {
        let mut a = engine();
        let mut b = engine();
        for _ in 0..20 {
            let pair = a.select_pair().unwrap();
            assert_ne!(pair.0, pair.1);
            assert_eq!(Some(pair), b.select_pair());
        }
    }
}
