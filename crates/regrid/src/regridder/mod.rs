//! Regridders between regular lat-lon and reduced Gaussian grids.
//!
//! Every regridder consumes a [`Dataset`] and returns the regridded one.
//! Regridding is synchronous and single-threaded.

mod apply;
mod format;
mod gaussian;
mod latlon;
mod to_latlon;

use crate::dataset::Dataset;
use crate::error::Result;

pub use apply::{regrid_array, regrid_dataset};
pub use format::{format_points, point_index};
pub use gaussian::GaussianRegridder;
pub use latlon::LatLonRegridder;
pub use to_latlon::{reduced_weights_file_name, GaussianToLatLonRegridder};

/// Common interface of all regridders.
pub trait Regridder {
    /// Regrid `ds` to the regridder's target grid.
    fn regrid(&self, ds: Dataset) -> Result<Dataset>;
}
