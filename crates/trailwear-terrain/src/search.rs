//! Resumable Dijkstra search over the 8-connected pixel grid.
//!
//! A [`Search`] owns all per-search state (tentative distances, visited
//! flags, one-byte predecessor codes, and the binary heap) and advances in
//! bounded [`Search::step`] calls. Between steps the caller is free to
//! flush progress, yield to its scheduler, or do anything else that does
//! not mutate the terrain. The loop state lives entirely in the struct, so
//! resuming is deterministic.
//!
//! Pixels popped for the first time are recorded and can be collected
//! with [`Search::drain_visited`] to drive a live exploration view.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::cost::CostParams;
use crate::error::TerrainError;
use crate::grid::{Direction, Grid};
use crate::terrain::Terrain;

/// Predecessor code for pixels with no recorded predecessor.
const NO_PREDECESSOR: u8 = u8::MAX;

/// A completed route.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    /// Flat pixel indices from start to goal, inclusive.
    pub path: Vec<usize>,
    /// Geometric path length divided by straight-line distance.
    pub efficiency: f64,
}

impl PathResult {
    /// Geometric length of a path: `1` per orthogonal step, `sqrt(2)` per
    /// diagonal step.
    pub fn geometric_length(grid: &Grid, path: &[usize]) -> f64 {
        path.windows(2)
            .filter_map(|pair| match *pair {
                [a, b] => grid.direction_between(a, b),
                _ => None,
            })
            .map(Direction::step_length)
            .sum()
    }

    /// Efficiency of `path`: geometric length over straight-line distance
    /// between its endpoints. A path whose endpoints coincide scores `1`.
    pub fn efficiency_of(grid: &Grid, path: &[usize]) -> f64 {
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            return 1.0;
        };
        let straight = grid.straight_distance(first, last).unwrap_or(0.0);
        if straight <= 0.0 {
            return 1.0;
        }
        Self::geometric_length(grid, path) / straight
    }
}

/// How a finished search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The goal was reached.
    Found(PathResult),
    /// The frontier emptied before the goal was reached.
    NoPathFound,
}

/// Heap entry ordered so that [`BinaryHeap`] pops the cheapest first.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f32,
    index: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// In-progress single-source route search.
#[derive(Debug)]
pub struct Search<'a> {
    terrain: &'a Terrain,
    params: &'a CostParams,
    start: usize,
    goal: usize,
    distance: Vec<f32>,
    visited: Vec<bool>,
    predecessor: Vec<u8>,
    heap: BinaryHeap<Frontier>,
    newly_visited: Vec<u32>,
    expanded: usize,
    outcome: Option<SearchOutcome>,
}

impl<'a> Search<'a> {
    /// Prepare a search from `start` to `goal`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::IndexOutOfBounds`] if either index lies
    /// outside the grid.
    pub fn new(
        terrain: &'a Terrain,
        params: &'a CostParams,
        start: usize,
        goal: usize,
    ) -> Result<Self, TerrainError> {
        let len = terrain.grid().len();
        for index in [start, goal] {
            if index >= len {
                return Err(TerrainError::IndexOutOfBounds { index, len });
            }
        }

        let mut distance = vec![f32::INFINITY; len];
        if let Some(slot) = distance.get_mut(start) {
            *slot = 0.0;
        }
        let mut heap = BinaryHeap::new();
        heap.push(Frontier {
            cost: 0.0,
            index: start,
        });

        Ok(Self {
            terrain,
            params,
            start,
            goal,
            distance,
            visited: vec![false; len],
            predecessor: vec![NO_PREDECESSOR; len],
            heap,
            newly_visited: Vec::new(),
            expanded: 0,
            outcome: None,
        })
    }

    /// Pop up to `budget` heap entries. Returns `true` once the search has
    /// finished (either outcome); further calls are no-ops.
    pub fn step(&mut self, budget: usize) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        for _ in 0..budget {
            let Some(Frontier { cost, index }) = self.heap.pop() else {
                trace!(expanded = self.expanded, "Search frontier exhausted");
                self.outcome = Some(SearchOutcome::NoPathFound);
                return true;
            };
            if self.visited.get(index).copied().unwrap_or(true) {
                continue;
            }
            if let Some(flag) = self.visited.get_mut(index) {
                *flag = true;
            }
            self.expanded = self.expanded.saturating_add(1);
            if let Ok(index32) = u32::try_from(index) {
                self.newly_visited.push(index32);
            }

            if index == self.goal {
                self.outcome = Some(self.reconstruct());
                return true;
            }
            self.relax_neighbors(index, cost);
        }
        false
    }

    fn relax_neighbors(&mut self, current: usize, cost: f32) {
        let grid = self.terrain.grid();
        for direction in Direction::ALL {
            let Some(next) = grid.neighbor(current, direction) else {
                continue;
            };
            if self.visited.get(next).copied().unwrap_or(true) {
                continue;
            }
            let Some(edge) = self.params.edge_cost(self.terrain, current, next, direction) else {
                continue;
            };
            let candidate = cost + edge;
            let existing = self.distance.get(next).copied().unwrap_or(f32::INFINITY);
            if self.params.should_prune(edge, existing, candidate) {
                continue;
            }
            if candidate < existing {
                if let Some(slot) = self.distance.get_mut(next) {
                    *slot = candidate;
                }
                if let Some(slot) = self.predecessor.get_mut(next) {
                    // Stored as the move from `next` back to `current`.
                    *slot = direction.opposite().code();
                }
                self.heap.push(Frontier {
                    cost: candidate,
                    index: next,
                });
            }
        }
    }

    fn reconstruct(&self) -> SearchOutcome {
        let grid = self.terrain.grid();
        let mut path = vec![self.goal];
        let mut current = self.goal;
        while current != self.start {
            // A simple path never revisits a pixel.
            if path.len() > grid.len() {
                return SearchOutcome::NoPathFound;
            }
            let code = self
                .predecessor
                .get(current)
                .copied()
                .unwrap_or(NO_PREDECESSOR);
            let Some(previous) =
                Direction::from_code(code).and_then(|d| grid.neighbor(current, d))
            else {
                return SearchOutcome::NoPathFound;
            };
            path.push(previous);
            current = previous;
        }
        path.reverse();
        let efficiency = PathResult::efficiency_of(grid, &path);
        SearchOutcome::Found(PathResult { path, efficiency })
    }

    /// Take the pixels visited since the previous drain.
    pub fn drain_visited(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.newly_visited)
    }

    /// Number of pixels visited so far.
    pub const fn expanded(&self) -> usize {
        self.expanded
    }

    /// Whether the search has finished.
    pub const fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Cumulative cost of the cheapest known route to `index`.
    pub fn distance_to(&self, index: usize) -> Option<f32> {
        self.distance.get(index).copied().filter(|d| d.is_finite())
    }

    /// Run the search to completion and return its outcome.
    ///
    /// Progress that has not been drained is discarded.
    pub fn finish(mut self) -> SearchOutcome {
        const CHUNK: usize = 4096;
        while !self.step(CHUNK) {
            self.newly_visited.clear();
        }
        self.outcome.unwrap_or(SearchOutcome::NoPathFound)
    }
}
