//! Regular latitude/longitude grids.

use grid_common::arange;

use super::GridExtent;
use crate::error::{RegridError, Result};

/// A rectilinear grid of 1D latitude and longitude axes.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularGrid {
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
}

impl RegularGrid {
    pub fn new(latitude: Vec<f64>, longitude: Vec<f64>) -> Self {
        Self { latitude, longitude }
    }

    /// Global cell-centred grid: latitudes from `-90 + res/2` below 90,
    /// longitudes from 0 below 360.
    pub fn global(resolution: f64) -> Result<Self> {
        check_resolution(resolution)?;
        Ok(Self {
            latitude: arange(-90.0 + resolution / 2.0, 90.0, resolution),
            longitude: arange(0.0, 360.0, resolution),
        })
    }

    /// Grid starting at the extent's minimum corner and reaching (at least)
    /// its maximum corner.
    pub fn covering(extent: &GridExtent, resolution: f64) -> Result<Self> {
        check_resolution(resolution)?;
        Ok(Self {
            latitude: arange(extent.lat_min, extent.lat_max + resolution, resolution),
            longitude: arange(extent.lon_min, extent.lon_max + resolution, resolution),
        })
    }

    /// Spacing of a latitude axis: `|lat[1] - lat[0]|`.
    pub fn resolution_of(latitude: &[f64]) -> Result<f64> {
        match latitude {
            [a, b, ..] => Ok((b - a).abs()),
            _ => Err(RegridError::degenerate(
                "at least two latitudes are needed to infer a resolution",
            )),
        }
    }

    /// `(n_lat, n_lon)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.latitude.len(), self.longitude.len())
    }
}

fn check_resolution(resolution: f64) -> Result<()> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(RegridError::invalid_grid(format!(
            "resolution must be positive, got {}",
            resolution
        )));
    }
    Ok(())
}
