//! Applying sparse weights to labeled arrays.

use ndarray::{Array2, IxDyn};
use tracing::{debug, warn};

use crate::dataset::{DataArray, Dataset};
use crate::error::{RegridError, Result};
use crate::grid::{LATITUDE, LONGITUDE};
use crate::weights::SparseWeights;

/// Move `dims` to the end of the array and flatten them, giving
/// `(batch, cells)` plus the remaining dimension names and sizes.
pub(crate) fn flatten_trailing(
    array: &DataArray,
    dims: &[&str],
) -> Result<Option<(Array2<f64>, Vec<String>, Vec<usize>)>> {
    let Some(axes) = dims.iter().map(|d| array.axis_of(d)).collect::<Option<Vec<_>>>() else {
        return Ok(None);
    };

    let others: Vec<usize> = (0..array.dims.len()).filter(|a| !axes.contains(a)).collect();
    let perm: Vec<usize> = others.iter().chain(&axes).copied().collect();

    let other_dims: Vec<String> = others.iter().map(|a| array.dims[*a].clone()).collect();
    let other_shape: Vec<usize> = others.iter().map(|a| array.shape()[*a]).collect();
    let batch: usize = other_shape.iter().product();
    let cells: usize = axes.iter().map(|a| array.shape()[*a]).product();

    let values = array
        .values()
        .permuted_axes(IxDyn(&perm))
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((batch, cells))?;

    Ok(Some((values, other_dims, other_shape)))
}

/// Regrid one array from `src_dims` onto `dst_dims`.
///
/// Returns `None` when the array does not carry every source dimension.
/// Non-spatial dimensions keep their order and come first; the result is `f32`.
pub fn regrid_array(
    array: &DataArray,
    src_dims: &[&str],
    weights: &SparseWeights,
    dst_dims: &[&str],
) -> Result<Option<DataArray>> {
    if dst_dims.len() != weights.dst_shape.len() {
        return Err(RegridError::shape_mismatch(format!(
            "{} destination dimensions for shape {:?}",
            dst_dims.len(),
            weights.dst_shape
        )));
    }

    let spatial_shape: Option<Vec<usize>> = src_dims.iter().map(|d| array.size_of(d)).collect();
    let Some(spatial_shape) = spatial_shape else {
        return Ok(None);
    };
    if spatial_shape != weights.src_shape {
        return Err(RegridError::shape_mismatch(format!(
            "'{}' has spatial shape {:?}, weights expect {:?}",
            array.name, spatial_shape, weights.src_shape
        )));
    }

    let Some((fields, mut dims, mut shape)) = flatten_trailing(array, src_dims)? else {
        return Ok(None);
    };

    let out = weights.apply_batch(fields.view())?;

    dims.extend(dst_dims.iter().map(|d| d.to_string()));
    shape.extend(&weights.dst_shape);
    let data = out.mapv(|v| v as f32).into_shape_with_order(IxDyn(&shape))?;

    debug!(variable = %array.name, shape = ?shape, "Regridded variable");

    let mut regridded = DataArray::new(array.name.clone(), dims, data)?;
    regridded.attrs = array.attrs.clone();
    Ok(Some(regridded))
}

/// Regrid every data variable. Variables with none of the source dimensions
/// are carried unchanged; variables with only some of them are dropped.
///
/// Coordinates over the source dimensions and the latitude/longitude
/// coordinates are dropped; the caller attaches the destination ones.
pub fn regrid_dataset(
    ds: &Dataset,
    src_dims: &[&str],
    weights: &SparseWeights,
    dst_dims: &[&str],
) -> Result<Dataset> {
    let mut out = Dataset::new();
    out.attrs = ds.attrs.clone();

    for coord in ds.coords.values() {
        let spatial = src_dims.iter().any(|d| coord.has_dim(d));
        if !spatial && coord.name != LATITUDE && coord.name != LONGITUDE {
            out.insert_coord(coord.clone())?;
        }
    }

    for var in ds.data_vars.values() {
        let present = src_dims.iter().filter(|d| var.has_dim(d)).count();
        if present > 0 && present < src_dims.len() {
            warn!(
                variable = %var.name,
                dims = ?var.dims,
                "Dropping variable with partial spatial dimensions"
            );
            continue;
        }
        match regrid_array(var, src_dims, weights, dst_dims)? {
            Some(regridded) => out.insert_var(regridded)?,
            None => out.insert_var(var.clone())?,
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ArrayData;
    use crate::weights::BILINEAR;
    use ndarray::Array3;

    #[test]
    fn test_spatial_dims_moved_last() {
        // (lat, time, lon) with lat=2, time=3, lon=2
        let data = Array3::from_shape_fn((2, 3, 2), |(i, t, j)| (t * 100 + i * 10 + j) as f64);
        let array = DataArray::new("v", ["lat", "time", "lon"], data.into_dyn()).unwrap();

        // Destination cell 0 takes source cell (1, 1).
        let mut w = SparseWeights::new(vec![2, 2], vec![1], BILINEAR);
        w.push(0, 3, 1.0);

        let out = regrid_array(&array, &["lat", "lon"], &w, &["point"])
            .unwrap()
            .unwrap();
        assert_eq!(out.dims, vec!["time".to_string(), "point".to_string()]);
        assert_eq!(out.to_vec(), vec![11.0, 111.0, 211.0]);
        assert!(matches!(out.data, ArrayData::F32(_)));
    }

    #[test]
    fn test_missing_dims_returns_none() {
        let array = DataArray::from_vec("v", "time", vec![1.0, 2.0]);
        let w = SparseWeights::new(vec![2, 2], vec![1], BILINEAR);
        assert!(regrid_array(&array, &["lat", "lon"], &w, &["point"])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_partial_spatial_variable_dropped() {
        let mut ds = Dataset::new();
        let field = ndarray::Array2::<f64>::ones((2, 2)).into_dyn();
        ds.insert_var(DataArray::new("t2m", ["lat", "lon"], field).unwrap())
            .unwrap();
        ds.insert_var(DataArray::from_vec("gw", "lat", vec![0.5, 0.5]))
            .unwrap();
        ds.insert_var(DataArray::from_vec("step", "time", vec![1.0, 2.0]))
            .unwrap();

        let mut w = SparseWeights::new(vec![2, 2], vec![1], BILINEAR);
        w.push(0, 0, 1.0);

        let out = regrid_dataset(&ds, &["lat", "lon"], &w, &["point"]).unwrap();
        assert!(!out.data_vars.contains_key("gw"));
        assert_eq!(out.data_vars["t2m"].dims, vec!["point".to_string()]);
        assert_eq!(out.data_vars["step"].to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let data = ndarray::Array2::<f64>::zeros((3, 3)).into_dyn();
        let array = DataArray::new("v", ["lat", "lon"], data).unwrap();
        let w = SparseWeights::new(vec![2, 2], vec![1], BILINEAR);
        assert!(matches!(
            regrid_array(&array, &["lat", "lon"], &w, &["point"]),
            Err(RegridError::ShapeMismatch(_))
        ));
    }
}
