//! Zarr reader for datasets written by [`crate::writer`].

mod zarr_reader;

pub(crate) use zarr_reader::{read_f64, read_u64};
pub use zarr_reader::{ArrayInfo, ZarrDatasetReader};
