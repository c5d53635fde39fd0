//! Zarr V3 dataset reader.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};
use serde_json::Value;
use tracing::debug;
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::group::Group;
use zarrs_filesystem::FilesystemStore;

use crate::dataset::{ArrayData, Attributes, DataArray, Dataset};
use crate::error::{RegridError, Result};
use crate::writer::{COORDS_ATTR, DATA_VARS_ATTR, DIMENSIONS_ATTR};

/// Shape and naming of a stored array, read from its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayInfo {
    pub name: String,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub attrs: Attributes,
}

impl ArrayInfo {
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn units(&self) -> Option<&str> {
        self.attrs.get("units").and_then(Value::as_str)
    }
}

/// Reader for a dataset stored as a Zarr V3 hierarchy.
///
/// Array metadata is read once at open; values are read on demand, either
/// whole or as a hyperslab.
pub struct ZarrDatasetReader {
    store: Arc<FilesystemStore>,
    path: PathBuf,
    attrs: Attributes,
    coords: Vec<ArrayInfo>,
    data_vars: Vec<ArrayInfo>,
}

impl ZarrDatasetReader {
    /// Open the hierarchy rooted at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RegridError::StorageError(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let store = Arc::new(
            FilesystemStore::new(path).map_err(|e| RegridError::StorageError(e.to_string()))?,
        );

        let group = Group::open(store.clone(), "/")
            .map_err(|e| RegridError::zarr_error(e.to_string()))?;
        let mut attrs = group.attributes().clone();

        let coord_names = take_names(&mut attrs, COORDS_ATTR)?;
        let var_names = take_names(&mut attrs, DATA_VARS_ATTR)?;

        let coords = coord_names
            .iter()
            .map(|name| array_info(&store, name))
            .collect::<Result<Vec<_>>>()?;
        let data_vars = var_names
            .iter()
            .map(|name| array_info(&store, name))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            path = %path.display(),
            coords = coords.len(),
            data_vars = data_vars.len(),
            "Opened Zarr dataset"
        );

        Ok(Self {
            store,
            path: path.to_path_buf(),
            attrs,
            coords,
            data_vars,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dataset-level attributes.
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn data_vars(&self) -> &[ArrayInfo] {
        &self.data_vars
    }

    pub fn coords(&self) -> &[ArrayInfo] {
        &self.coords
    }

    pub fn data_var(&self, name: &str) -> Result<&ArrayInfo> {
        self.data_vars
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| RegridError::MissingVariable(name.to_string()))
    }

    pub fn coord(&self, name: &str) -> Result<&ArrayInfo> {
        self.coords
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| RegridError::MissingCoordinate(name.to_string()))
    }

    /// Every dimension with its size.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        let mut dims = BTreeMap::new();
        for info in self.coords.iter().chain(&self.data_vars) {
            for (dim, size) in info.dims.iter().zip(&info.shape) {
                dims.entry(dim.clone()).or_insert(*size);
            }
        }
        dims
    }

    fn info(&self, name: &str) -> Result<&ArrayInfo> {
        self.data_var(name).or_else(|_| self.coord(name))
    }

    /// Read a whole coordinate or data variable.
    pub fn read_array(&self, name: &str) -> Result<DataArray> {
        self.read_subset(name, &BTreeMap::new())
    }

    /// Read the hyperslab given by per-dimension index ranges.
    ///
    /// Dimensions without a range are read in full.
    pub fn read_subset(&self, name: &str, ranges: &BTreeMap<String, Range<usize>>) -> Result<DataArray> {
        let info = self.info(name)?;

        let mut start = Vec::with_capacity(info.shape.len());
        let mut shape = Vec::with_capacity(info.shape.len());
        for (dim, len) in info.dims.iter().zip(&info.shape) {
            let range = ranges.get(dim).cloned().unwrap_or(0..*len);
            if range.start > range.end || range.end > *len {
                return Err(RegridError::shape_mismatch(format!(
                    "range {:?} out of bounds for dimension '{}' (size {})",
                    range, dim, len
                )));
            }
            start.push(range.start as u64);
            shape.push(range.len());
        }

        let data = self.read_hyperslab(info, start, &shape)?;
        let mut array = DataArray::new(info.name.clone(), info.dims.clone(), data)?;
        array.attrs = info.attrs.clone();
        Ok(array)
    }

    /// Read the whole dataset into memory.
    pub fn read_dataset(&self) -> Result<Dataset> {
        self.read_selection(&BTreeMap::new())
    }

    /// Read every array restricted to the given per-dimension ranges.
    pub fn read_selection(&self, ranges: &BTreeMap<String, Range<usize>>) -> Result<Dataset> {
        let mut ds = Dataset::new();
        ds.attrs = self.attrs.clone();
        for info in &self.coords {
            ds.insert_coord(self.read_subset(&info.name, ranges)?)?;
        }
        for info in &self.data_vars {
            ds.insert_var(self.read_subset(&info.name, ranges)?)?;
        }
        Ok(ds)
    }

    fn read_hyperslab(&self, info: &ArrayInfo, start: Vec<u64>, shape: &[usize]) -> Result<ArrayData> {
        let array = open_array(&self.store, &info.name)?;

        // Zero-dimensional arrays are stored as a single element.
        let (start, stored_shape) = if info.dims.is_empty() {
            (vec![0], vec![1u64])
        } else {
            (start, shape.iter().map(|s| *s as u64).collect())
        };

        let dim = IxDyn(shape);
        if shape.iter().any(|s| *s == 0) {
            return Ok(match array.data_type() {
                DataType::Float32 => ArrayData::F32(ArrayD::zeros(dim)),
                _ => ArrayData::F64(ArrayD::zeros(dim)),
            });
        }

        let subset = ArraySubset::new_with_start_shape(start, stored_shape)
            .map_err(|e| RegridError::zarr_error(e.to_string()))?;

        macro_rules! retrieve {
            ($t:ty) => {
                array
                    .retrieve_array_subset_elements::<$t>(&subset)
                    .map_err(|e| RegridError::zarr_error(e.to_string()))?
            };
        }

        // Integer arrays are widened to f64.
        macro_rules! widen {
            ($t:ty) => {
                ArrayData::F64(ArrayD::from_shape_vec(
                    dim,
                    retrieve!($t).into_iter().map(|v| v as f64).collect(),
                )?)
            };
        }

        let data = match array.data_type() {
            DataType::Float32 => ArrayData::F32(ArrayD::from_shape_vec(dim, retrieve!(f32))?),
            DataType::Float64 => ArrayData::F64(ArrayD::from_shape_vec(dim, retrieve!(f64))?),
            DataType::Int32 => widen!(i32),
            DataType::Int64 => widen!(i64),
            DataType::UInt32 => widen!(u32),
            DataType::UInt64 => widen!(u64),
            other => {
                return Err(RegridError::invalid_metadata(format!(
                    "unsupported data type {:?} for '{}'",
                    other, info.name
                )))
            }
        };

        Ok(data)
    }
}

/// Read a whole `u64` array.
pub(crate) fn read_u64(store: &Arc<FilesystemStore>, name: &str) -> Result<Vec<u64>> {
    read_flat(store, name, |array, subset| array.retrieve_array_subset_elements::<u64>(subset))
}

/// Read a whole `f64` array.
pub(crate) fn read_f64(store: &Arc<FilesystemStore>, name: &str) -> Result<Vec<f64>> {
    read_flat(store, name, |array, subset| array.retrieve_array_subset_elements::<f64>(subset))
}

fn read_flat<T, F, E>(store: &Arc<FilesystemStore>, name: &str, retrieve: F) -> Result<Vec<T>>
where
    F: FnOnce(&Array<FilesystemStore>, &ArraySubset) -> std::result::Result<Vec<T>, E>,
    E: std::fmt::Display,
{
    let array = open_array(store, name)?;
    if array.shape().iter().any(|s| *s == 0) {
        return Ok(Vec::new());
    }
    let subset = array.subset_all();
    retrieve(&array, &subset).map_err(|e| RegridError::zarr_error(e.to_string()))
}

pub(crate) fn open_array(store: &Arc<FilesystemStore>, name: &str) -> Result<Array<FilesystemStore>> {
    Array::open(store.clone(), &format!("/{}", name))
        .map_err(|e| RegridError::zarr_error(format!("{}: {}", name, e)))
}

fn array_info(store: &Arc<FilesystemStore>, name: &str) -> Result<ArrayInfo> {
    let array = open_array(store, name)?;
    let mut attrs = array.attributes().clone();

    let dims: Vec<String> = match attrs.remove(DIMENSIONS_ATTR) {
        Some(value) => serde_json::from_value(value)?,
        None => {
            return Err(RegridError::invalid_metadata(format!(
                "array '{}' has no {} attribute",
                name, DIMENSIONS_ATTR
            )))
        }
    };

    let shape: Vec<usize> = if dims.is_empty() {
        Vec::new()
    } else {
        array.shape().iter().map(|s| *s as usize).collect()
    };

    if dims.len() != shape.len() {
        return Err(RegridError::invalid_metadata(format!(
            "array '{}' has {} dimension names for {} axes",
            name,
            dims.len(),
            shape.len()
        )));
    }

    Ok(ArrayInfo {
        name: name.to_string(),
        dims,
        shape,
        attrs,
    })
}

fn take_names(attrs: &mut Attributes, key: &str) -> Result<Vec<String>> {
    match attrs.remove(key) {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}
