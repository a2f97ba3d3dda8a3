//! Grid geometry: dimensions, flat indexing, and 8-connected directions.
//!
//! Every per-pixel field in this crate is a flat `Vec` of length
//! `width * height` indexed as `y * width + x`. [`Grid::new`] guarantees
//! the pixel count fits in a `u32`, so any valid index converts to `u32`
//! without loss when it crosses the engine boundary.

use std::f64::consts::SQRT_2;

use crate::error::TerrainError;

/// One of the eight compass moves between adjacent pixels.
///
/// The discriminant doubles as the compact predecessor code stored by the
/// route search (one byte per pixel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// `(0, -1)`
    North = 0,
    /// `(1, -1)`
    NorthEast = 1,
    /// `(1, 0)`
    East = 2,
    /// `(1, 1)`
    SouthEast = 3,
    /// `(0, 1)`
    South = 4,
    /// `(-1, 1)`
    SouthWest = 5,
    /// `(-1, 0)`
    West = 6,
    /// `(-1, -1)`
    NorthWest = 7,
}

impl Direction {
    /// All eight directions in code order.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Column offset of this move.
    pub const fn dx(self) -> i32 {
        match self {
            Self::North | Self::South => 0,
            Self::NorthEast | Self::East | Self::SouthEast => 1,
            Self::SouthWest | Self::West | Self::NorthWest => -1,
        }
    }

    /// Row offset of this move.
    pub const fn dy(self) -> i32 {
        match self {
            Self::East | Self::West => 0,
            Self::SouthEast | Self::South | Self::SouthWest => 1,
            Self::North | Self::NorthEast | Self::NorthWest => -1,
        }
    }

    /// Whether this is a diagonal move.
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest
        )
    }

    /// Geometric length of the move: `1` orthogonal, `sqrt(2)` diagonal.
    pub const fn step_length(self) -> f64 {
        if self.is_diagonal() { SQRT_2 } else { 1.0 }
    }

    /// The move pointing the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }

    /// Compact one-byte code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a one-byte code. Returns `None` for anything above 7.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::North),
            1 => Some(Self::NorthEast),
            2 => Some(Self::East),
            3 => Some(Self::SouthEast),
            4 => Some(Self::South),
            5 => Some(Self::SouthWest),
            6 => Some(Self::West),
            7 => Some(Self::NorthWest),
            _ => None,
        }
    }
}

/// Immutable raster dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
}

impl Grid {
    /// Create a grid.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ZeroDimension`] if either side is zero, or
    /// [`TerrainError::GridTooLarge`] if the pixel count does not fit in a
    /// `u32`.
    pub fn new(width: u32, height: u32) -> Result<Self, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::ZeroDimension { width, height });
        }
        if width.checked_mul(height).is_none() {
            return Err(TerrainError::GridTooLarge { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width in pixels.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels.
    #[allow(clippy::arithmetic_side_effects)] // product checked in `new`
    pub const fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Always `false`; a grid has at least one pixel.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Flat index of `(x, y)`, or `None` if outside the grid.
    pub fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)
    }

    /// Flat index of `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::PixelOutOfBounds`] if outside the grid.
    pub fn try_index(&self, x: u32, y: u32) -> Result<usize, TerrainError> {
        self.index(x, y).ok_or(TerrainError::PixelOutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }

    /// Pixel coordinates of a flat index, or `None` if outside the grid.
    pub fn coords(&self, index: usize) -> Option<(u32, u32)> {
        if index >= self.len() {
            return None;
        }
        let width = self.width as usize;
        let x = u32::try_from(index.checked_rem(width)?).ok()?;
        let y = u32::try_from(index.checked_div(width)?).ok()?;
        Some((x, y))
    }

    /// Index of the pixel one step from `index` in `direction`, or `None`
    /// when the step leaves the grid.
    pub fn neighbor(&self, index: usize, direction: Direction) -> Option<usize> {
        let (x, y) = self.coords(index)?;
        let nx = x.checked_add_signed(direction.dx())?;
        let ny = y.checked_add_signed(direction.dy())?;
        self.index(nx, ny)
    }

    /// The direction leading from `from` to the adjacent pixel `to`, or
    /// `None` if the two are not 8-adjacent.
    pub fn direction_between(&self, from: usize, to: usize) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&d| self.neighbor(from, d) == Some(to))
    }

    /// Whether two pixels are distinct and 8-adjacent.
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.direction_between(a, b).is_some()
    }

    /// Straight-line distance in pixels between two indices.
    pub fn straight_distance(&self, a: usize, b: usize) -> Option<f64> {
        let (ax, ay) = self.coords(a)?;
        let (bx, by) = self.coords(b)?;
        let dx = f64::from(ax) - f64::from(bx);
        let dy = f64::from(ay) - f64::from(by);
        Some(dx.hypot(dy))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_rejected() {
        assert!(Grid::new(0, 5).is_err());
        assert!(Grid::new(5, 0).is_err());
    }

    #[test]
    fn oversized_grid_rejected() {
        assert!(matches!(
            Grid::new(u32::MAX, 2),
            Err(TerrainError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn index_and_coords_agree() {
        let grid = Grid::new(7, 5).unwrap();
        assert_eq!(grid.len(), 35);
        assert_eq!(grid.index(3, 2), Some(17));
        assert_eq!(grid.coords(17), Some((3, 2)));
        assert_eq!(grid.index(7, 0), None);
        assert_eq!(grid.coords(35), None);
    }

    #[test]
    fn neighbors_stop_at_edges() {
        let grid = Grid::new(3, 3).unwrap();
        let corner = grid.index(0, 0).unwrap();
        let present: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|&d| grid.neighbor(corner, d).is_some())
            .collect();
        assert_eq!(
            present,
            vec![Direction::East, Direction::SouthEast, Direction::South]
        );

        let center = grid.index(1, 1).unwrap();
        assert!(Direction::ALL.iter().all(|&d| grid.neighbor(center, d).is_some()));
    }

    #[test]
    fn codes_round_trip_and_opposites_cancel() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_code(d.code()), Some(d));
            assert_eq!(d.opposite().opposite(), d);
            assert_eq!(d.dx() + d.opposite().dx(), 0);
            assert_eq!(d.dy() + d.opposite().dy(), 0);
        }
        assert_eq!(Direction::from_code(8), None);
    }

    #[test]
    fn adjacency() {
        let grid = Grid::new(4, 4).unwrap();
        let a = grid.index(1, 1).unwrap();
        let b = grid.index(2, 2).unwrap();
        let c = grid.index(3, 3).unwrap();
        assert!(grid.are_adjacent(a, b));
        assert!(!grid.are_adjacent(a, c));
        assert!(!grid.are_adjacent(a, a));
        // Row wrap is not adjacency.
        let end_of_row = grid.index(3, 0).unwrap();
        let start_of_next = grid.index(0, 1).unwrap();
        assert!(!grid.are_adjacent(end_of_row, start_of_next));
    }
}
