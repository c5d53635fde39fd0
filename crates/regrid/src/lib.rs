//! Regridding between reduced Gaussian and regular lat-lon grids.
//!
//! This crate holds the dataset model, Zarr V3 storage and the regridding
//! pipelines:
//!
//! - **Grid construction**: padded curvilinear target grids from reduced
//!   Gaussian row descriptions, with a validity mask
//! - **Weights**: sparse bilinear operators, cached as Zarr groups
//! - **Regridders**: regular to reduced, reduced to regular, and regular
//!   resolution changes
//!
//! # Architecture
//!
//! ```text
//! Zarr store
//!      │
//!      ▼
//! ZarrDatasetReader::read_dataset()
//!      │
//!      ▼
//! Regridder::regrid(ds)
//!      │
//!      ├─► add cyclic longitude
//!      ├─► build target grid
//!      ├─► WeightsCache::load_or_compute()
//!      ├─► apply weights per variable
//!      └─► flatten (y, x) into point, drop padding
//!               │
//!               ▼
//!      ZarrDatasetWriter::write()
//! ```
//!
//! # Example
//!
//! ```ignore
//! use regrid::{GaussianRegridder, RegridConfig, Regridder, ZarrDatasetReader, ZarrDatasetWriter};
//!
//! let config = RegridConfig::from_env();
//! let ds = ZarrDatasetReader::open(input)?.read_dataset()?;
//! let regridder = GaussianRegridder::from_config("N320", &config)?;
//! let out = regridder.regrid(ds)?;
//! ZarrDatasetWriter::new(config).write(&out, output)?;
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod reader;
pub mod rechunk;
pub mod regridder;
pub mod weights;
pub mod writer;

// Re-export commonly used types at crate root
pub use config::{RegridConfig, ZarrCompression};
pub use dataset::{ArrayData, Attributes, DataArray, Dataset};
pub use error::{RegridError, Result};
pub use grid::{create_target_grid, GridExtent, GridInfo, GridRow, RegularGrid, TargetGrid};
pub use reader::{ArrayInfo, ZarrDatasetReader};
pub use rechunk::rechunk;
pub use regridder::{GaussianRegridder, GaussianToLatLonRegridder, LatLonRegridder, Regridder};
pub use weights::{SparseWeights, WeightsCache};
pub use writer::{parse_chunk_specs, ChunkSpec, ZarrDatasetWriter, ZarrWriteSummary};
