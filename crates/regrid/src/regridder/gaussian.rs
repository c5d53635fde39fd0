//! Regular lat-lon to reduced Gaussian grid.

use std::path::PathBuf;

use tracing::info;

use super::apply::regrid_dataset;
use super::format::format_points;
use super::Regridder;
use crate::config::RegridConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::grid::{
    add_cyclic_longitude, create_target_grid, GridExtent, GridInfo, RegularGrid, LATITUDE,
    LONGITUDE, X, Y,
};
use crate::weights::bilinear::regular_to_points;
use crate::weights::{weights_file_name, SparseWeights, WeightsCache};

/// Regrids regular lat-lon datasets onto a named reduced Gaussian grid.
///
/// The output is a flat point dataset: every variable over `latitude` and
/// `longitude` becomes a variable over `point`.
pub struct GaussianRegridder {
    grid_name: String,
    grid_info: GridInfo,
    config: RegridConfig,
    cache: Option<WeightsCache>,
}

impl GaussianRegridder {
    /// Regridder for an in-memory grid description; weights are not cached.
    pub fn new(grid_name: impl Into<String>, grid_info: GridInfo) -> Self {
        Self {
            grid_name: grid_name.into(),
            grid_info,
            config: RegridConfig::default(),
            cache: None,
        }
    }

    /// Load `{grid_info_dir}/{grid_name}.json` and cache weights in the
    /// configured weights directory.
    pub fn from_config(grid_name: &str, config: &RegridConfig) -> Result<Self> {
        let grid_info = GridInfo::load(&config.grid_info_dir, grid_name)?;
        Ok(Self {
            grid_name: grid_name.to_string(),
            grid_info,
            config: config.clone(),
            cache: Some(WeightsCache::from_config(config)),
        })
    }

    /// Cache weights under `dir`.
    pub fn with_weights_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache = Some(WeightsCache::new(dir, self.config.clone()));
        self
    }

    pub fn grid_name(&self) -> &str {
        &self.grid_name
    }

    pub fn grid_info(&self) -> &GridInfo {
        &self.grid_info
    }
}

impl Regridder for GaussianRegridder {
    fn regrid(&self, ds: Dataset) -> Result<Dataset> {
        let ds = add_cyclic_longitude(ds)?;
        let extent = GridExtent::of(&ds)?;
        let target = create_target_grid(&self.grid_info, &extent)?;

        let src_lat = ds.coord_values(LATITUDE)?;
        let src_lon = ds.coord_values(LONGITUDE)?;
        let src_shape = [src_lat.len(), src_lon.len()];
        let (rows, width) = target.shape();
        let dst_shape = [rows, width];

        let compute = || -> Result<SparseWeights> {
            regular_to_points(&src_lat, &src_lon, &target.points(), dst_shape.to_vec())
        };

        let weights = match &self.cache {
            Some(cache) => {
                let resolution = RegularGrid::resolution_of(&src_lat)?;
                let name = weights_file_name(resolution, &self.grid_name);
                cache.load_or_compute(&name, &src_shape, &dst_shape, compute)?
            }
            None => compute()?,
        };

        let regridded = regrid_dataset(&ds, &[LATITUDE, LONGITUDE], &weights, &[Y, X])?;
        let formatted = format_points(regridded, &target)?;

        info!(
            grid = %self.grid_name,
            points = target.valid_count(),
            variables = formatted.data_vars.len(),
            "Regridded to reduced Gaussian grid"
        );

        Ok(formatted)
    }
}
