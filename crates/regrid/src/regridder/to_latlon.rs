//! Reduced Gaussian point grid to regular lat-lon.

use std::path::PathBuf;

use tracing::info;

use super::apply::regrid_dataset;
use super::latlon::carry_attrs;
use super::Regridder;
use crate::config::RegridConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::grid::{GridExtent, RegularGrid, LATITUDE, LONGITUDE, POINT};
use crate::weights::bilinear::reduced_to_regular;
use crate::weights::{SparseWeights, WeightsCache};

/// File name for reduced-to-regular weights at a resolution.
pub fn reduced_weights_file_name(resolution: f64) -> String {
    format!("regrid_weights_reduced_to_{:.2}.zarr", resolution)
}

/// Regrids a point dataset on a reduced Gaussian grid onto a regular grid
/// covering its extent.
pub struct GaussianToLatLonRegridder {
    resolution: f64,
    config: RegridConfig,
    cache: Option<WeightsCache>,
    weights_path: Option<PathBuf>,
}

impl GaussianToLatLonRegridder {
    pub fn new(resolution: f64) -> Self {
        Self {
            resolution,
            config: RegridConfig::default(),
            cache: None,
            weights_path: None,
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

    /// Load or store weights at an explicit path.
    pub fn with_weights_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.weights_path = Some(path.into());
        self
    }
}

impl Regridder for GaussianToLatLonRegridder {
    fn regrid(&self, ds: Dataset) -> Result<Dataset> {
        let extent = GridExtent::of(&ds)?;
        let target = RegularGrid::covering(&extent, self.resolution)?;

        let src_lat = ds.coord_values(LATITUDE)?;
        let src_lon = ds.coord_values(LONGITUDE)?;
        let src_shape = [src_lat.len()];
        let (n_lat, n_lon) = target.shape();
        let dst_shape = [n_lat, n_lon];

        let compute = || -> Result<SparseWeights> {
            reduced_to_regular(&src_lat, &src_lon, &target.latitude, &target.longitude)
        };

        let weights = match (&self.weights_path, &self.cache) {
            (Some(path), _) => crate::weights::cache::load_or_compute(
                path,
                &src_shape,
                &dst_shape,
                &self.config,
                compute,
            )?,
            (None, Some(cache)) => cache.load_or_compute(
                &reduced_weights_file_name(self.resolution),
                &src_shape,
                &dst_shape,
                compute,
            )?,
            (None, None) => compute()?,
        };

        let mut out = regrid_dataset(&ds, &[POINT], &weights, &[LATITUDE, LONGITUDE])?;
        out.insert_coord(carry_attrs(&ds, LATITUDE, target.latitude.clone()))?;
        out.insert_coord(carry_attrs(&ds, LONGITUDE, target.longitude.clone()))?;

        info!(
            resolution = self.resolution,
            lat = n_lat,
            lon = n_lon,
            "Regridded reduced grid to regular lat-lon"
        );
        Ok(out)
    }
}
