//! Flattening curvilinear output into a dense point index.

use ndarray::{Array1, Axis, IxDyn};

use super::apply::flatten_trailing;
use crate::dataset::{DataArray, Dataset};
use crate::error::Result;
use crate::grid::{TargetGrid, LATITUDE, LONGITUDE, POINT, X, Y};

/// Flatten `(y, x)` into `point`, dropping padding cells.
///
/// The result has `latitude(point)`, `longitude(point)` and a dense
/// zero-based `point` coordinate; its point count equals the number of valid
/// cells in the grid mask.
pub fn format_points(ds: Dataset, grid: &TargetGrid) -> Result<Dataset> {
    let valid: Vec<usize> = grid
        .mask
        .iter()
        .enumerate()
        .filter(|(_, v)| **v)
        .map(|(i, _)| i)
        .collect();

    let mut out = Dataset::new();
    out.attrs = ds.attrs.clone();

    for coord in ds.coords.values() {
        if !coord.has_dim(Y) && !coord.has_dim(X) {
            out.insert_coord(coord.clone())?;
        }
    }

    let lats: Vec<f64> = grid.latitude.iter().copied().collect();
    let lons: Vec<f64> = grid.longitude.iter().copied().collect();
    out.insert_coord(DataArray::from_vec(
        LATITUDE,
        POINT,
        valid.iter().map(|i| lats[*i]).collect(),
    ))?;
    out.insert_coord(DataArray::from_vec(
        LONGITUDE,
        POINT,
        valid.iter().map(|i| lons[*i]).collect(),
    ))?;
    out.insert_coord(DataArray::from_vec(
        POINT,
        POINT,
        point_index(valid.len()).to_vec(),
    ))?;

    for var in ds.data_vars.into_values() {
        let Some((flat, mut dims, mut shape)) = flatten_trailing(&var, &[Y, X])? else {
            out.insert_var(var)?;
            continue;
        };

        let kept = flat.select(Axis(1), &valid);
        dims.push(POINT.to_string());
        shape.push(valid.len());

        let values = kept
            .mapv(|v| v as f32)
            .into_shape_with_order(IxDyn(&shape))?;
        let mut formatted = DataArray::new(var.name.clone(), dims, values)?;
        formatted.attrs = var.attrs;
        out.insert_var(formatted)?;
    }

    Ok(out)
}

/// Dense zero-based point index.
pub fn point_index(n: usize) -> Array1<f64> {
    Array1::from_iter((0..n).map(|i| i as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{create_target_grid, GridExtent, GridInfo, GridRow};
    use ndarray::Array3;

    #[test]
    fn test_point_count_matches_mask() {
        let info = GridInfo::from_rows(vec![
            GridRow { latitude: 0.0, reduced_point: 4 },
            GridRow { latitude: 10.0, reduced_point: 2 },
        ]);
        let extent = GridExtent {
            lat_min: -90.0,
            lat_max: 90.0,
            lon_min: 0.0,
            lon_max: 100.0,
        };
        let grid = create_target_grid(&info, &extent).unwrap();

        let data = Array3::from_shape_fn((2, 2, 4), |(t, y, x)| (t * 100 + y * 10 + x) as f32);
        let mut ds = Dataset::new();
        ds.insert_coord(DataArray::from_vec("time", "time", vec![0.0, 6.0]))
            .unwrap();
        let mut var = DataArray::new("t2m", ["time", Y, X], data.into_dyn()).unwrap();
        var.attrs.insert("units".into(), "K".into());
        ds.insert_var(var).unwrap();

        let out = format_points(ds, &grid).unwrap();
        let t2m = out.var("t2m").unwrap();

        assert_eq!(t2m.dims, vec!["time".to_string(), POINT.to_string()]);
        assert_eq!(t2m.shape(), &[2, 6]);
        assert_eq!(
            t2m.to_vec(),
            vec![0.0, 1.0, 2.0, 3.0, 10.0, 11.0, 100.0, 101.0, 102.0, 103.0, 110.0, 111.0]
        );
        assert_eq!(t2m.units(), Some("K"));
        assert_eq!(
            out.coord_values(LONGITUDE).unwrap(),
            vec![0.0, 25.0, 50.0, 75.0, 0.0, 50.0]
        );
        assert_eq!(
            out.coord_values(LATITUDE).unwrap(),
            vec![0.0, 0.0, 0.0, 0.0, 10.0, 10.0]
        );
        assert_eq!(out.coord_values(POINT).unwrap(), point_index(6).to_vec());
        assert_eq!(out.coord_values("time").unwrap(), vec![0.0, 6.0]);
    }
}
