//! Settlements: the named population centers routes run between.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A named point of interest on the terrain grid.
///
/// Settlements are immutable after load. Names are unique within a
/// settlement set; the engine rejects duplicates at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Settlement {
    /// Unique display name.
    pub name: String,
    /// Population used as the selection weight. Always positive.
    pub population: f64,
    /// Pixel column.
    pub x: u32,
    /// Pixel row.
    pub y: u32,
}

impl Settlement {
    /// Create a settlement at the given pixel.
    pub fn new(name: impl Into<String>, population: f64, x: u32, y: u32) -> Self {
        Self {
            name: name.into(),
            population,
            x,
            y,
        }
    }

    /// Straight-line distance in pixels to another settlement.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Settlement::new("A", 10.0, 0, 0);
        let b = Settlement::new("B", 10.0, 3, 4);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
        assert!((b.distance_to(&a) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn serializes_flat() {
        let s = Settlement::new("Harbor", 1200.0, 7, 9);
        let json = serde_json::to_value(&s).unwrap_or_default();
        assert_eq!(json["name"], "Harbor");
        assert_eq!(json["x"], 7);
        assert_eq!(json["y"], 9);
    }
}
