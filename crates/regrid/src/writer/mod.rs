//! Zarr writer for datasets.
//!
//! Used by the regrid pipelines and the rechunk tool to persist results in
//! Zarr V3 format with configurable chunking and compression.

mod zarr_writer;

pub(crate) use zarr_writer::{write_group, Elements};
pub use zarr_writer::{
    parse_chunk_specs, ChunkSpec, ZarrDatasetWriter, ZarrWriteSummary, COORDS_ATTR,
    DATA_VARS_ATTR, DIMENSIONS_ATTR,
};
