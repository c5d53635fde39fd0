//! Grid descriptors: regular axes, reduced Gaussian rows and the cyclic seam.

pub mod cyclic;
pub mod reduced;
pub mod regular;

use crate::dataset::Dataset;
use crate::error::{RegridError, Result};

pub use cyclic::add_cyclic_longitude;
pub use reduced::{create_target_grid, GridInfo, GridRow, TargetGrid};
pub use regular::RegularGrid;

/// Name of the latitude coordinate and dimension.
pub const LATITUDE: &str = "latitude";
/// Name of the longitude coordinate and dimension.
pub const LONGITUDE: &str = "longitude";
/// Flat point dimension of reduced grids.
pub const POINT: &str = "point";
/// Row dimension of curvilinear grids.
pub const Y: &str = "y";
/// Column dimension of curvilinear grids.
pub const X: &str = "x";

/// Observed latitude/longitude bounds of a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridExtent {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl GridExtent {
    /// Bounds of the `latitude` and `longitude` coordinates, ignoring NaN.
    pub fn of(ds: &Dataset) -> Result<Self> {
        let (lat_min, lat_max) = finite_bounds(LATITUDE, &ds.coord_values(LATITUDE)?)?;
        let (lon_min, lon_max) = finite_bounds(LONGITUDE, &ds.coord_values(LONGITUDE)?)?;
        Ok(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }
}

fn finite_bounds(name: &str, values: &[f64]) -> Result<(f64, f64)> {
    let bounds = values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });

    bounds.ok_or_else(|| RegridError::degenerate(format!("coordinate '{}' has no finite values", name)))
}
