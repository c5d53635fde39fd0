//! Wrap-around longitude handling.

use tracing::debug;

use super::LONGITUDE;
use crate::dataset::{DataArray, Dataset};
use crate::error::Result;

/// Longitude of the duplicated seam column.
pub const CYCLIC_LONGITUDE: f64 = 360.0;

/// Append a longitude-360 column when the dataset does not already reach it.
///
/// Applies only when `max(lon) != 360` and `min(lon) >= 0`. The column nearest
/// to longitude 0 is duplicated at the end of every array that carries the
/// longitude dimension.
pub fn add_cyclic_longitude(ds: Dataset) -> Result<Dataset> {
    let lons = ds.coord_values(LONGITUDE)?;
    if lons.is_empty() {
        return Ok(ds);
    }

    let max = lons.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = lons.iter().copied().fold(f64::INFINITY, f64::min);
    if max == CYCLIC_LONGITUDE || min < 0.0 {
        return Ok(ds);
    }

    let nearest = lons
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut indices: Vec<usize> = (0..lons.len()).collect();
    indices.push(nearest);

    let mut extended = ds.select(LONGITUDE, &indices)?;

    let lon_coord = ds.coord(LONGITUDE)?;
    let mut values = lons;
    values.push(CYCLIC_LONGITUDE);
    let dim = lon_coord.dims.first().cloned().unwrap_or_else(|| LONGITUDE.to_string());
    extended.coords.insert(
        LONGITUDE.to_string(),
        DataArray::from_vec(LONGITUDE, dim, values).with_attrs(lon_coord.attrs.clone()),
    );

    debug!(source_column = nearest, "Added cyclic longitude column");
    Ok(extended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::LATITUDE;
    use ndarray::Array2;

    fn dataset(lons: Vec<f64>) -> Dataset {
        let n = lons.len();
        let mut ds = Dataset::new();
        ds.insert_coord(DataArray::from_vec(LATITUDE, LATITUDE, vec![0.0, 10.0]))
            .unwrap();
        ds.insert_coord(DataArray::from_vec(LONGITUDE, LONGITUDE, lons))
            .unwrap();
        let t = Array2::from_shape_fn((2, n), |(i, j)| (i * 100 + j) as f32).into_dyn();
        ds.insert_var(DataArray::new("t", [LATITUDE, LONGITUDE], t).unwrap())
            .unwrap();
        ds
    }

    #[test]
    fn test_appends_seam_column() {
        let ds = add_cyclic_longitude(dataset(vec![0.0, 90.0, 180.0, 270.0])).unwrap();
        assert_eq!(
            ds.coord_values(LONGITUDE).unwrap(),
            vec![0.0, 90.0, 180.0, 270.0, 360.0]
        );
        let t = ds.var("t").unwrap();
        assert_eq!(t.shape(), &[2, 5]);
        assert_eq!(t.to_vec()[4], 0.0);
        assert_eq!(t.to_vec()[9], 100.0);
        assert!(ds.validate().is_ok());
    }

    #[test]
    fn test_duplicates_column_nearest_zero() {
        let ds = add_cyclic_longitude(dataset(vec![1.0, 91.0, 181.0, 271.0])).unwrap();
        let t = ds.var("t").unwrap().to_vec();
        assert_eq!(t[4], 0.0);
    }

    #[test]
    fn test_skips_when_seam_present() {
        let original = dataset(vec![0.0, 120.0, 240.0, 360.0]);
        let ds = add_cyclic_longitude(original.clone()).unwrap();
        assert_eq!(ds, original);
    }

    #[test]
    fn test_skips_negative_longitudes() {
        let original = dataset(vec![-180.0, -90.0, 0.0, 90.0]);
        let ds = add_cyclic_longitude(original.clone()).unwrap();
        assert_eq!(ds, original);
    }
}
