//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
///
/// `min_x`/`max_x` are the west/east longitudes and `min_y`/`max_y` the
/// south/north latitudes. Containment checks use the closed interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates without validation.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build a validated box from west/south/east/north edges.
    ///
    /// Rejects non-finite edges, `west >= east` and `south >= north`.
    pub fn from_edges(west: f64, south: f64, east: f64, north: f64) -> Result<Self, BboxError> {
        for (name, value) in [("west", west), ("south", south), ("east", east), ("north", north)] {
            if !value.is_finite() {
                return Err(BboxError::NonFinite {
                    edge: name,
                    value,
                });
            }
        }

        if west >= east {
            return Err(BboxError::InvertedLongitude { west, east });
        }

        if south >= north {
            return Err(BboxError::InvertedLatitude { south, north });
        }

        Ok(Self::new(west, south, east, north))
    }

    /// Check if a point (lon, lat) lies within the closed box.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Indices of the `(lon, lat)` pairs that fall inside the box.
    pub fn filter_points<I>(&self, points: I) -> Vec<usize>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points
            .into_iter()
            .enumerate()
            .filter(|(_, (x, y))| self.contains_point(*x, *y))
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxError {
    #[error("bbox edge '{edge}' is not finite: {value}")]
    NonFinite { edge: &'static str, value: f64 },

    #[error("west ({west}) must be smaller than east ({east})")]
    InvertedLongitude { west: f64, east: f64 },

    #[error("south ({south}) must be smaller than north ({north})")]
    InvertedLatitude { south: f64, north: f64 },
}
