//! Region loading: terrain raster and settlement list.
//!
//! The raster is decoded with the `image` crate and flattened to RGB8
//! before classification. Settlements arrive as geographic coordinates
//! and are projected into pixels with the region's bounds; any that land
//! outside the raster are dropped with a warning.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};
use trailwear_core::config::GeoBounds;
use trailwear_terrain::{ElevationField, TerrainError};
use trailwear_types::Settlement;

/// Errors that can occur while loading a region from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The raster image could not be opened or decoded.
    #[error("failed to decode raster {path}: {source}")]
    Image {
        /// Raster path.
        path: PathBuf,
        /// The underlying decode error.
        source: image::ImageError,
    },

    /// The settlements file could not be read.
    #[error("failed to read settlements {path}: {source}")]
    Io {
        /// Settlements path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The settlements file is not valid JSON of the expected shape.
    #[error("failed to parse settlements: {source}")]
    Json {
        /// The underlying parse error.
        #[from]
        source: serde_json::Error,
    },

    /// The decoded raster could not be turned into an elevation field.
    #[error("terrain error: {source}")]
    Terrain {
        /// The underlying terrain error.
        #[from]
        source: TerrainError,
    },

    /// The region bounds span zero degrees on an axis.
    #[error("region bounds are degenerate: {bounds:?}")]
    DegenerateBounds {
        /// The offending bounds.
        bounds: GeoBounds,
    },
}

/// A settlement as stored on disk, before projection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SettlementRecord {
    /// Display name.
    pub name: String,
    /// Population (selection weight).
    pub population: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// Decode the raster at `path` into an elevation field.
///
/// # Errors
///
/// Returns [`LoadError::Image`] if the file cannot be decoded, or
/// [`LoadError::Terrain`] if the raster has unusable dimensions.
pub fn load_elevation(path: &Path, tolerance: u8) -> Result<ElevationField, LoadError> {
    let rgb = image::open(path)
        .map_err(|source| LoadError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    let field = ElevationField::from_rgb(width, height, rgb.as_raw(), tolerance)?;
    info!(
        path = %path.display(),
        width,
        height,
        water_pixels = field.water_count(),
        "Raster loaded"
    );
    Ok(field)
}

/// Read and project the settlements file at `path`.
///
/// # Errors
///
/// Returns [`LoadError::Io`] or [`LoadError::Json`] for unreadable input
/// and [`LoadError::DegenerateBounds`] for unusable bounds.
pub fn load_settlements(
    path: &Path,
    bounds: &GeoBounds,
    width: u32,
    height: u32,
) -> Result<Vec<Settlement>, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<SettlementRecord> = serde_json::from_str(&contents)?;
    let settlements = place_settlements(&records, bounds, width, height)?;
    info!(
        path = %path.display(),
        listed = records.len(),
        placed = settlements.len(),
        "Settlements loaded"
    );
    Ok(settlements)
}

/// Project `records` onto a `width` x `height` raster.
///
/// # Errors
///
/// Returns [`LoadError::DegenerateBounds`] if `bounds` cannot project.
pub fn place_settlements(
    records: &[SettlementRecord],
    bounds: &GeoBounds,
    width: u32,
    height: u32,
) -> Result<Vec<Settlement>, LoadError> {
    let mut placed = Vec::with_capacity(records.len());
    for record in records {
        let (x, y) = bounds
            .project(record.lat, record.lon, width, height)
            .ok_or(LoadError::DegenerateBounds { bounds: *bounds })?;
        match (to_pixel(x, width), to_pixel(y, height)) {
            (Some(px), Some(py)) => {
                placed.push(Settlement::new(record.name.clone(), record.population, px, py));
            }
            _ => {
                warn!(
                    name = record.name,
                    lat = record.lat,
                    lon = record.lon,
                    "Settlement outside raster, skipping"
                );
            }
        }
    }
    Ok(placed)
}

/// Floor a fractional coordinate into `0..limit`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixel(value: f64, limit: u32) -> Option<u32> {
    (0.0..f64::from(limit))
        .contains(&value)
        .then(|| value.floor() as u32)
}
