//! Labeled multi-dimensional arrays.
//!
//! A [`Dataset`] is a collection of named [`DataArray`]s split into
//! coordinates and data variables. Every array names its dimensions, and a
//! dimension name always maps to one size across the whole dataset.

pub mod selection;

use std::collections::BTreeMap;

use ndarray::{Array1, ArrayD, Axis};
use serde_json::{Map, Value};

use crate::error::{RegridError, Result};

pub use selection::{label_index, range_indices};

/// Attribute map attached to arrays and datasets.
pub type Attributes = Map<String, Value>;

/// Numeric payload of a [`DataArray`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl ArrayData {
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::F32(a) => a.shape(),
            Self::F64(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage type name as written to Zarr.
    pub fn dtype(&self) -> &'static str {
        match self {
            Self::F32(_) => "float32",
            Self::F64(_) => "float64",
        }
    }

    /// Values widened to `f64`.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            Self::F32(a) => a.mapv(f64::from),
            Self::F64(a) => a.clone(),
        }
    }

    /// Values narrowed to `f32`.
    pub fn to_f32(&self) -> ArrayD<f32> {
        match self {
            Self::F32(a) => a.clone(),
            Self::F64(a) => a.mapv(|v| v as f32),
        }
    }

    fn select(&self, axis: usize, indices: &[usize]) -> Self {
        match self {
            Self::F32(a) => Self::F32(a.select(Axis(axis), indices)),
            Self::F64(a) => Self::F64(a.select(Axis(axis), indices)),
        }
    }

    fn index_axis(&self, axis: usize, index: usize) -> Self {
        match self {
            Self::F32(a) => Self::F32(a.index_axis(Axis(axis), index).to_owned()),
            Self::F64(a) => Self::F64(a.index_axis(Axis(axis), index).to_owned()),
        }
    }
}

impl From<ArrayD<f32>> for ArrayData {
    fn from(a: ArrayD<f32>) -> Self {
        Self::F32(a)
    }
}

impl From<ArrayD<f64>> for ArrayData {
    fn from(a: ArrayD<f64>) -> Self {
        Self::F64(a)
    }
}

/// A named array with named dimensions and free-form attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub name: String,
    pub dims: Vec<String>,
    pub data: ArrayData,
    pub attrs: Attributes,
}

impl DataArray {
    /// Create an array, checking that every axis has a dimension name.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        dims: impl IntoIterator<Item = S>,
        data: impl Into<ArrayData>,
    ) -> Result<Self> {
        let name = name.into();
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        let data = data.into();

        if dims.len() != data.ndim() {
            return Err(RegridError::shape_mismatch(format!(
                "'{}' has {} dimension names for {} axes",
                name,
                dims.len(),
                data.ndim()
            )));
        }

        Ok(Self {
            name,
            dims,
            data,
            attrs: Attributes::new(),
        })
    }

    /// One-dimensional `f64` array over a single dimension.
    pub fn from_vec(name: impl Into<String>, dim: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            dims: vec![dim.into()],
            data: ArrayData::F64(Array1::from(values).into_dyn()),
            attrs: Attributes::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Axis position of a dimension.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis_of(dim).is_some()
    }

    /// Size of a dimension, if the array has it.
    pub fn size_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.shape()[axis])
    }

    pub fn units(&self) -> Option<&str> {
        self.attrs.get("units").and_then(Value::as_str)
    }

    /// Values widened to `f64`.
    pub fn values(&self) -> ArrayD<f64> {
        self.data.to_f64()
    }

    /// Values flattened in logical order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values().iter().copied().collect()
    }

    /// Same array with its data cast to `f32`.
    pub fn into_f32(self) -> Self {
        let data = match self.data {
            ArrayData::F32(a) => ArrayData::F32(a),
            ArrayData::F64(a) => ArrayData::F32(a.mapv(|v| v as f32)),
        };
        Self { data, ..self }
    }

    /// Keep the given positions along `dim`. Arrays without `dim` are returned as-is.
    pub fn select(&self, dim: &str, indices: &[usize]) -> Result<Self> {
        let Some(axis) = self.axis_of(dim) else {
            return Ok(self.clone());
        };
        check_indices(&self.name, dim, self.shape()[axis], indices)?;

        Ok(Self {
            data: self.data.select(axis, indices),
            ..self.clone()
        })
    }

    /// Take a single position along `dim`, dropping the dimension.
    pub fn isel(&self, dim: &str, index: usize) -> Result<Self> {
        let Some(axis) = self.axis_of(dim) else {
            return Ok(self.clone());
        };
        check_indices(&self.name, dim, self.shape()[axis], &[index])?;

        let mut dims = self.dims.clone();
        dims.remove(axis);
        Ok(Self {
            name: self.name.clone(),
            dims,
            data: self.data.index_axis(axis, index),
            attrs: self.attrs.clone(),
        })
    }
}

fn check_indices(name: &str, dim: &str, size: usize, indices: &[usize]) -> Result<()> {
    if let Some(bad) = indices.iter().find(|&&i| i >= size) {
        return Err(RegridError::shape_mismatch(format!(
            "index {} out of bounds for dimension '{}' of '{}' (size {})",
            bad, dim, name, size
        )));
    }
    Ok(())
}

/// A collection of coordinates and data variables sharing dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub coords: BTreeMap<String, DataArray>,
    pub data_vars: BTreeMap<String, DataArray>,
    pub attrs: Attributes,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a coordinate.
    pub fn insert_coord(&mut self, array: DataArray) -> Result<()> {
        self.check_dims(&array)?;
        self.coords.insert(array.name.clone(), array);
        Ok(())
    }

    /// Add or replace a data variable.
    pub fn insert_var(&mut self, array: DataArray) -> Result<()> {
        self.check_dims(&array)?;
        self.data_vars.insert(array.name.clone(), array);
        Ok(())
    }

    fn check_dims(&self, array: &DataArray) -> Result<()> {
        for other in self.arrays().filter(|a| a.name != array.name) {
            for (dim, size) in array.dims.iter().zip(array.shape()) {
                match other.size_of(dim) {
                    Some(existing) if existing != *size => {
                        return Err(RegridError::shape_mismatch(format!(
                            "dimension '{}' of '{}' has size {}, expected {}",
                            dim, array.name, size, existing
                        )));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Coordinates followed by data variables.
    pub fn arrays(&self) -> impl Iterator<Item = &DataArray> {
        self.coords.values().chain(self.data_vars.values())
    }

    /// Every dimension with its size.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        let mut dims = BTreeMap::new();
        for array in self.arrays() {
            for (dim, size) in array.dims.iter().zip(array.shape()) {
                dims.entry(dim.clone()).or_insert(*size);
            }
        }
        dims
    }

    /// Reject a dimension used with two different sizes.
    pub fn validate(&self) -> Result<()> {
        let mut seen: BTreeMap<&str, (usize, &str)> = BTreeMap::new();
        for array in self.arrays() {
            for (dim, size) in array.dims.iter().zip(array.shape()) {
                match seen.get(dim.as_str()) {
                    Some((existing, owner)) if existing != size => {
                        return Err(RegridError::shape_mismatch(format!(
                            "dimension '{}' is {} in '{}' but {} in '{}'",
                            dim, existing, owner, size, array.name
                        )));
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(dim, (*size, &array.name));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn coord(&self, name: &str) -> Result<&DataArray> {
        self.coords
            .get(name)
            .ok_or_else(|| RegridError::MissingCoordinate(name.to_string()))
    }

    pub fn var(&self, name: &str) -> Result<&DataArray> {
        self.data_vars
            .get(name)
            .ok_or_else(|| RegridError::MissingVariable(name.to_string()))
    }

    /// Values of a coordinate, flattened.
    pub fn coord_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.coord(name)?.to_vec())
    }

    /// Keep the given positions along `dim` in every array that has it.
    pub fn select(&self, dim: &str, indices: &[usize]) -> Result<Self> {
        Ok(Self {
            coords: select_all(&self.coords, |a| a.select(dim, indices))?,
            data_vars: select_all(&self.data_vars, |a| a.select(dim, indices))?,
            attrs: self.attrs.clone(),
        })
    }

    /// Take one position along `dim` in every array, dropping the dimension.
    ///
    /// A 1D coordinate over `dim` becomes a scalar coordinate.
    pub fn isel(&self, dim: &str, index: usize) -> Result<Self> {
        Ok(Self {
            coords: select_all(&self.coords, |a| a.isel(dim, index))?,
            data_vars: select_all(&self.data_vars, |a| a.isel(dim, index))?,
            attrs: self.attrs.clone(),
        })
    }

    /// Same dataset with every data variable cast to `f32`.
    pub fn into_f32(self) -> Self {
        Self {
            data_vars: self
                .data_vars
                .into_iter()
                .map(|(k, v)| (k, v.into_f32()))
                .collect(),
            ..self
        }
    }
}

fn select_all<F>(arrays: &BTreeMap<String, DataArray>, f: F) -> Result<BTreeMap<String, DataArray>>
where
    F: Fn(&DataArray) -> Result<DataArray>,
{
    arrays
        .iter()
        .map(|(name, array)| Ok((name.clone(), f(array)?)))
        .collect()
}
