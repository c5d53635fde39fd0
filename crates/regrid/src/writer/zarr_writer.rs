//! Zarr V3 writer for datasets.
//!
//! A dataset becomes a root group listing its coordinates and data
//! variables, with one array per variable at `/<name>`. Dimension names are
//! recorded in each array's `_ARRAY_DIMENSIONS` attribute.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::codec::BytesToBytesCodecTraits;
use zarrs::array::{ArrayBuilder, ChunkGrid, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

use crate::config::{RegridConfig, ZarrCompression};
use crate::dataset::{ArrayData, Attributes, DataArray, Dataset};
use crate::error::{RegridError, Result};

/// Attribute holding an array's dimension names.
pub const DIMENSIONS_ATTR: &str = "_ARRAY_DIMENSIONS";
/// Group attribute listing data variable names.
pub const DATA_VARS_ATTR: &str = "data_vars";
/// Group attribute listing coordinate names.
pub const COORDS_ATTR: &str = "coords";

/// Chunk edge for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSpec {
    /// Fixed edge length.
    Size(usize),
    /// One chunk spanning the whole dimension.
    Full,
}

impl ChunkSpec {
    /// Parse `"-1"` as [`ChunkSpec::Full`], any positive integer as a size.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "-1" => Ok(Self::Full),
            other => match other.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Self::Size(n)),
                _ => Err(RegridError::ConfigError(format!(
                    "invalid chunk size '{}'",
                    other
                ))),
            },
        }
    }

    fn edge(&self, len: usize) -> u64 {
        let edge = match self {
            Self::Size(n) => (*n).min(len),
            Self::Full => len,
        };
        edge.max(1) as u64
    }
}

/// Parse `"dim=size,dim=size"` chunk specifications.
pub fn parse_chunk_specs(spec: &str) -> Result<BTreeMap<String, ChunkSpec>> {
    spec.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (dim, size) = part.split_once('=').ok_or_else(|| {
                RegridError::ConfigError(format!("expected 'dim=size', got '{}'", part))
            })?;
            Ok((dim.trim().to_string(), ChunkSpec::parse(size)?))
        })
        .collect()
}

/// Summary of a dataset write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZarrWriteSummary {
    /// Arrays written (coordinates and data variables).
    pub arrays: usize,
    /// Uncompressed bytes written.
    pub bytes_written: u64,
}

/// Borrowed element buffers accepted by the writer.
#[derive(Clone, Copy)]
pub(crate) enum Elements<'a> {
    F32(&'a [f32]),
    F64(&'a [f64]),
    U64(&'a [u64]),
}

impl Elements<'_> {
    fn data_type(&self) -> DataType {
        match self {
            Self::F32(_) => DataType::Float32,
            Self::F64(_) => DataType::Float64,
            Self::U64(_) => DataType::UInt64,
        }
    }

    fn fill_value(&self) -> FillValue {
        match self {
            Self::F32(_) => FillValue::from(f32::NAN),
            Self::F64(_) => FillValue::from(f64::NAN),
            Self::U64(_) => FillValue::from(0u64),
        }
    }

    fn typesize(&self) -> usize {
        match self {
            Self::F32(_) => 4,
            Self::F64(_) | Self::U64(_) => 8,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::U64(v) => v.len(),
        }
    }
}

/// Writer for Zarr V3 dataset hierarchies on the local filesystem.
pub struct ZarrDatasetWriter {
    config: RegridConfig,
    chunks: BTreeMap<String, ChunkSpec>,
}

impl ZarrDatasetWriter {
    /// Create a writer using the configured default chunk edge for every dimension.
    pub fn new(config: RegridConfig) -> Self {
        Self {
            config,
            chunks: BTreeMap::new(),
        }
    }

    /// Override the chunk edge of specific dimensions.
    pub fn with_chunks(mut self, chunks: BTreeMap<String, ChunkSpec>) -> Self {
        self.chunks = chunks;
        self
    }

    /// Write a dataset to a new store at `path`.
    pub fn write(&self, ds: &Dataset, path: &Path) -> Result<ZarrWriteSummary> {
        ds.validate()?;

        if path.join("zarr.json").exists() {
            return Err(RegridError::StorageError(format!(
                "{} already contains a Zarr hierarchy",
                path.display()
            )));
        }

        std::fs::create_dir_all(path)?;
        let store = Arc::new(
            FilesystemStore::new(path).map_err(|e| RegridError::StorageError(e.to_string()))?,
        );

        let mut attrs = ds.attrs.clone();
        attrs.insert(
            DATA_VARS_ATTR.to_string(),
            json!(ds.data_vars.keys().collect::<Vec<_>>()),
        );
        attrs.insert(
            COORDS_ATTR.to_string(),
            json!(ds.coords.keys().collect::<Vec<_>>()),
        );
        write_group(&store, attrs)?;

        let mut summary = ZarrWriteSummary {
            arrays: 0,
            bytes_written: 0,
        };
        for array in ds.arrays() {
            summary.bytes_written += self.write_data_array(&store, array)?;
            summary.arrays += 1;
        }

        info!(
            path = %path.display(),
            arrays = summary.arrays,
            bytes = summary.bytes_written,
            compression = %self.config.zarr_compression,
            "Wrote Zarr dataset"
        );

        Ok(summary)
    }

    /// Chunk shape for an array, honouring per-dimension overrides.
    pub fn chunk_shape(&self, dims: &[String], shape: &[usize]) -> Vec<u64> {
        let default = ChunkSpec::Size(self.config.chunk_size);
        dims.iter()
            .zip(shape)
            .map(|(dim, len)| self.chunks.get(dim).unwrap_or(&default).edge(*len))
            .collect()
    }

    fn write_data_array(&self, store: &Arc<FilesystemStore>, array: &DataArray) -> Result<u64> {
        let mut attrs = array.attrs.clone();
        attrs.insert(DIMENSIONS_ATTR.to_string(), json!(array.dims));

        let chunks = self.chunk_shape(&array.dims, array.shape());

        match &array.data {
            ArrayData::F32(a) => {
                let values: Vec<f32> = a.iter().copied().collect();
                self.write_elements(store, &array.name, array.shape(), chunks, attrs, Elements::F32(&values))
            }
            ArrayData::F64(a) => {
                let values: Vec<f64> = a.iter().copied().collect();
                self.write_elements(store, &array.name, array.shape(), chunks, attrs, Elements::F64(&values))
            }
        }
    }

    /// Write one array at `/<name>`. Zero-dimensional arrays are stored with
    /// a single element.
    pub(crate) fn write_elements(
        &self,
        store: &Arc<FilesystemStore>,
        name: &str,
        shape: &[usize],
        chunks: Vec<u64>,
        attrs: Attributes,
        elements: Elements<'_>,
    ) -> Result<u64> {
        let (shape, chunks): (Vec<u64>, Vec<u64>) = if shape.is_empty() {
            (vec![1], vec![1])
        } else {
            (shape.iter().map(|s| *s as u64).collect(), chunks)
        };

        let chunk_grid: ChunkGrid = chunks
            .clone()
            .try_into()
            .map_err(|e| RegridError::ConfigError(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            shape.clone(),
            elements.data_type(),
            chunk_grid,
            elements.fill_value(),
        );
        let mut builder = binding.attributes(attrs);

        if self.config.zarr_compression != ZarrCompression::None {
            let codec = self.create_compression_codec(elements.typesize())?;
            builder = builder.bytes_to_bytes_codecs(vec![codec]);
        }

        let path = format!("/{}", name);
        let zarr_array = builder
            .build(store.clone(), &path)
            .map_err(|e| RegridError::StorageError(e.to_string()))?;

        zarr_array
            .store_metadata()
            .map_err(|e| RegridError::StorageError(e.to_string()))?;

        if elements.len() > 0 {
            let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape.clone())
                .map_err(|e| RegridError::StorageError(e.to_string()))?;

            let stored = match elements {
                Elements::F32(v) => zarr_array.store_array_subset_elements(&subset, v),
                Elements::F64(v) => zarr_array.store_array_subset_elements(&subset, v),
                Elements::U64(v) => zarr_array.store_array_subset_elements(&subset, v),
            };
            stored.map_err(|e| RegridError::StorageError(e.to_string()))?;
        }

        debug!(array = name, shape = ?shape, chunks = ?chunks, "Wrote Zarr array");

        Ok((elements.len() * elements.typesize()) as u64)
    }

    /// Create the compression codec based on configuration.
    fn create_compression_codec(&self, typesize: usize) -> Result<Arc<dyn BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.zarr_compression_level)
            .map_err(|_| RegridError::ConfigError("Invalid compression level".to_string()))?;

        let shuffle = if self.config.zarr_shuffle {
            BloscShuffleMode::Shuffle
        } else {
            BloscShuffleMode::NoShuffle
        };

        // typesize is required when shuffle is enabled
        let typesize = self.config.zarr_shuffle.then_some(typesize);

        let compressor = match self.config.zarr_compression {
            ZarrCompression::None => {
                return Err(RegridError::ConfigError(
                    "No compression configured".to_string(),
                ))
            }
            ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
            ZarrCompression::BloscZstd => BloscCompressor::Zstd,
        };

        let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
            .map_err(|e| RegridError::ConfigError(e.to_string()))?;

        Ok(Arc::new(codec))
    }
}

/// Store the root group metadata with the given attributes.
pub(crate) fn write_group(store: &Arc<FilesystemStore>, attrs: Map<String, Value>) -> Result<()> {
    let mut builder = GroupBuilder::new();
    builder.attributes(attrs);
    builder
        .build(store.clone(), "/")
        .map_err(|e| RegridError::zarr_error(e.to_string()))?
        .store_metadata()
        .map_err(|e| RegridError::StorageError(e.to_string()))
}
