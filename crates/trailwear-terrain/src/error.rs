//! Error types for the `trailwear-terrain` crate.
//!
//! Every variant is a configuration problem: malformed raster input or an
//! out-of-range coordinate. An exhausted search is not an error; see
//! [`SearchOutcome::NoPathFound`](crate::search::SearchOutcome::NoPathFound).

/// Errors that can occur while building or querying terrain fields.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// A raster dimension was zero.
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The grid has more pixels than a `u32` index can address.
    #[error("grid of {width}x{height} pixels exceeds the addressable index space")]
    GridTooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A raster buffer does not match `3 * width * height` bytes.
    #[error("raster buffer holds {actual} bytes, expected {expected}")]
    BufferLength {
        /// Expected byte count.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },

    /// A per-pixel field does not match the grid's pixel count.
    #[error("field holds {actual} values, expected {expected}")]
    FieldLength {
        /// Expected value count.
        expected: usize,
        /// Actual value count.
        actual: usize,
    },

    /// A pixel coordinate lies outside the grid.
    #[error("pixel ({x}, {y}) is outside the {width}x{height} grid")]
    PixelOutOfBounds {
        /// Pixel column.
        x: u32,
        /// Pixel row.
        y: u32,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },

    /// A flat pixel index lies outside the grid.
    #[error("pixel index {index} is outside a grid of {len} pixels")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Number of pixels in the grid.
        len: usize,
    },

    /// A cost parameter is outside its valid range.
    #[error("invalid cost parameter: {0}")]
    InvalidCost(String),
}
