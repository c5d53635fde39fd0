//! Regular lat-lon resolution change.

use std::path::PathBuf;

use grid_common::is_close;
use tracing::info;

use super::apply::regrid_dataset;
use super::Regridder;
use crate::config::RegridConfig;
use crate::dataset::{DataArray, Dataset};
use crate::error::Result;
use crate::grid::{add_cyclic_longitude, RegularGrid, LATITUDE, LONGITUDE};
use crate::weights::bilinear::regular_to_points;
use crate::weights::{weights_file_name, SparseWeights, WeightsCache};

/// Re-interpolates a regular lat-lon dataset onto a global grid of another
/// resolution.
pub struct LatLonRegridder {
    resolution: Option<f64>,
    config: RegridConfig,
    cache: Option<WeightsCache>,
}

impl LatLonRegridder {
    /// `None` leaves every dataset unchanged.
    pub fn new(resolution: Option<f64>) -> Self {
        Self {
            resolution,
            config: RegridConfig::default(),
            cache: None,
        }
    }

    pub fn with_config(mut self, config: RegridConfig) -> Self {
        self.config = config;
        self
    }

    /// Cache weights under `dir`.
    pub fn with_weights_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache = Some(WeightsCache::new(dir, self.config.clone()));
        self
    }

    pub fn resolution(&self) -> Option<f64> {
        self.resolution
    }
}

impl Regridder for LatLonRegridder {
    fn regrid(&self, ds: Dataset) -> Result<Dataset> {
        let Some(target_res) = self.resolution else {
            return Ok(ds);
        };

        let current_res = RegularGrid::resolution_of(&ds.coord_values(LATITUDE)?)?;
        if is_close(target_res, current_res) {
            info!(resolution = current_res, "No regridding needed, resolution matches target");
            return Ok(ds);
        }

        info!(current = current_res, target = target_res, "Regridding required");

        let target = RegularGrid::global(target_res)?;
        let ds = add_cyclic_longitude(ds)?;
        let src_lat = ds.coord_values(LATITUDE)?;
        let src_lon = ds.coord_values(LONGITUDE)?;
        let src_shape = [src_lat.len(), src_lon.len()];
        let (n_lat, n_lon) = target.shape();
        let dst_shape = [n_lat, n_lon];

        let compute = || -> Result<SparseWeights> {
            let points: Vec<(f64, f64)> = target
                .latitude
                .iter()
                .flat_map(|lat| target.longitude.iter().map(move |lon| (*lat, *lon)))
                .collect();
            regular_to_points(&src_lat, &src_lon, &points, dst_shape.to_vec())
        };

        let weights = match &self.cache {
            Some(cache) => {
                let name = weights_file_name(current_res, &format!("{}", target_res));
                cache.load_or_compute(&name, &src_shape, &dst_shape, compute)?
            }
            None => compute()?,
        };

        let mut out = regrid_dataset(&ds, &[LATITUDE, LONGITUDE], &weights, &[LATITUDE, LONGITUDE])?;
        out.insert_coord(carry_attrs(&ds, LATITUDE, target.latitude.clone()))?;
        out.insert_coord(carry_attrs(&ds, LONGITUDE, target.longitude.clone()))?;

        info!(lat = n_lat, lon = n_lon, "New grid dimensions");
        Ok(out)
    }
}

/// New 1D coordinate keeping the attributes of the one it replaces.
pub(crate) fn carry_attrs(ds: &Dataset, name: &str, values: Vec<f64>) -> DataArray {
    let attrs = ds.coords.get(name).map(|c| c.attrs.clone()).unwrap_or_default();
    DataArray::from_vec(name, name, values).with_attrs(attrs)
}
