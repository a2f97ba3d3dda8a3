//! Elevation field built from a greyscale terrain raster.
//!
//! The raster convention is that land is painted in shades of grey and
//! water in any non-grey color. A pixel whose channels all lie within
//! `tolerance` of each other is land; its mean brightness is stored as a
//! monotonic elevation proxy (darker is lower). Every other pixel stores
//! the [`WATER`] sentinel.
//!
//! The field is immutable once built.

use tracing::debug;

use crate::error::TerrainError;
use crate::grid::Grid;

/// Sentinel stored for water pixels. Below every valid brightness.
pub const WATER: f32 = -1.0;

/// Sentinel stored for pixels no route may enter.
///
/// Never produced by [`ElevationField::from_rgb`]; loaders that mask out
/// regions write it through [`ElevationField::from_values`].
pub const IMPASSABLE: f32 = f32::INFINITY;

/// Default greyscale tolerance in channel units.
pub const DEFAULT_GREYSCALE_TOLERANCE: u8 = 10;

/// Whether an elevation value is the water sentinel.
pub fn is_water(value: f32) -> bool {
    value < 0.0
}

/// Whether an elevation value is the impassable sentinel.
pub const fn is_impassable(value: f32) -> bool {
    value.is_infinite()
}

/// Per-pixel elevation proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationField {
    grid: Grid,
    values: Vec<f32>,
}

impl ElevationField {
    /// Build the field from a packed RGB8 buffer.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ZeroDimension`] or
    /// [`TerrainError::GridTooLarge`] for bad dimensions, and
    /// [`TerrainError::BufferLength`] if `rgb` is not exactly
    /// `3 * width * height` bytes.
    pub fn from_rgb(
        width: u32,
        height: u32,
        rgb: &[u8],
        tolerance: u8,
    ) -> Result<Self, TerrainError> {
        let grid = Grid::new(width, height)?;
        let expected = grid
            .len()
            .checked_mul(3)
            .ok_or(TerrainError::GridTooLarge { width, height })?;
        if rgb.len() != expected {
            return Err(TerrainError::BufferLength {
                expected,
                actual: rgb.len(),
            });
        }

        let values: Vec<f32> = rgb
            .chunks_exact(3)
            .map(|px| match *px {
                [r, g, b] => classify(r, g, b, tolerance),
                _ => WATER,
            })
            .collect();

        let field = Self { grid, values };
        debug!(
            width,
            height,
            water_pixels = field.water_count(),
            "Elevation field built"
        );
        Ok(field)
    }

    /// Wrap precomputed values (e.g. a masked or synthetic terrain).
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::FieldLength`] if `values` does not match the
    /// grid's pixel count.
    pub fn from_values(grid: Grid, values: Vec<f32>) -> Result<Self, TerrainError> {
        if values.len() != grid.len() {
            return Err(TerrainError::FieldLength {
                expected: grid.len(),
                actual: values.len(),
            });
        }
        Ok(Self { grid, values })
    }

    /// A dry field at constant elevation.
    pub fn flat(grid: Grid, level: f32) -> Self {
        Self {
            grid,
            values: vec![level; grid.len()],
        }
    }

    /// The grid this field covers.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Elevation at `index`, or `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Whether `index` is water. Out-of-bounds indices are not water.
    pub fn is_water(&self, index: usize) -> bool {
        self.get(index).is_some_and(is_water)
    }

    /// Whether `index` may not be entered. Out-of-bounds indices are
    /// impassable.
    pub fn is_impassable(&self, index: usize) -> bool {
        self.get(index).is_none_or(is_impassable)
    }

    /// Number of water pixels.
    pub fn water_count(&self) -> usize {
        self.values.iter().filter(|&&v| is_water(v)).count()
    }

    /// Raw values in index order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Classify one RGB pixel as land (mean brightness) or water.
fn classify(r: u8, g: u8, b: u8, tolerance: u8) -> f32 {
    let hi = r.max(g).max(b);
    let lo = r.min(g).min(b);
    if hi.saturating_sub(lo) > tolerance {
        return WATER;
    }
    let sum = u16::from(r)
        .saturating_add(u16::from(g))
        .saturating_add(u16::from(b));
    f32::from(sum) / 3.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rgb(pixels: &[[u8; 3]]) -> Vec<u8> {
        pixels.iter().flatten().copied().collect()
    }

    #[test]
    fn grey_is_land_color_is_water() {
        let buf = rgb(&[[100, 100, 100], [0, 0, 255], [40, 45, 50], [40, 60, 40]]);
        let field = ElevationField::from_rgb(2, 2, &buf, 10).unwrap();

        assert!(!field.is_water(0));
        assert!(field.is_water(1));
        // Spread of 10 is within tolerance.
        assert!(!field.is_water(2));
        // Spread of 20 is not.
        assert!(field.is_water(3));
        assert!((field.get(0).unwrap() - 100.0).abs() < 1e-6);
        assert!((field.get(2).unwrap() - 45.0).abs() < 1e-6);
        assert_eq!(field.water_count(), 2);
    }

    #[test]
    fn buffer_length_mismatch_is_fatal() {
        let buf = vec![0_u8; 11];
        assert!(matches!(
            ElevationField::from_rgb(2, 2, &buf, 10),
            Err(TerrainError::BufferLength {
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn zero_dimension_is_fatal() {
        assert!(matches!(
            ElevationField::from_rgb(0, 3, &[], 10),
            Err(TerrainError::ZeroDimension { .. })
        ));
    }

    #[test]
    fn build_is_idempotent() {
        let buf = rgb(&[
            [10, 10, 10],
            [200, 0, 0],
            [128, 130, 129],
            [255, 255, 255],
            [0, 80, 200],
            [60, 60, 61],
        ]);
        let a = ElevationField::from_rgb(3, 2, &buf, 10).unwrap();
        let b = ElevationField::from_rgb(3, 2, &buf, 10).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.water_count(), b.water_count());
    }

    #[test]
    fn from_values_checks_length() {
        let grid = Grid::new(2, 2).unwrap();
        assert!(ElevationField::from_values(grid, vec![0.0; 3]).is_err());
        let field = ElevationField::from_values(grid, vec![0.0, WATER, IMPASSABLE, 5.0]).unwrap();
        assert!(field.is_water(1));
        assert!(field.is_impassable(2));
        assert!(!field.is_impassable(3));
        assert!(field.is_impassable(99));
    }
}
