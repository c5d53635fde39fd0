//! Test data generators for synthetic lat-lon fields and reduced grids.
//!
//! Fields are returned as flat row-major vectors (latitude outer, longitude
//! inner) so callers can shape them with whatever array type they use.

use std::path::{Path, PathBuf};

/// Evenly spaced axis of `n` values starting at `start`.
///
/// # Example
///
/// ```
/// use test_utils::regular_axis;
///
/// assert_eq!(regular_axis(0.0, 2.5, 3), vec![0.0, 2.5, 5.0]);
/// ```
pub fn regular_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Descending latitudes from 90 to -90 at `resolution` degrees.
pub fn global_latitudes(resolution: f64) -> Vec<f64> {
    let n = (180.0 / resolution).round() as usize + 1;
    regular_axis(90.0, -resolution, n)
}

/// Longitudes from 0 up to (excluding) 360 at `resolution` degrees.
pub fn global_longitudes(resolution: f64) -> Vec<f64> {
    let n = (360.0 / resolution).round() as usize;
    regular_axis(0.0, resolution, n)
}

/// Field `a * lat + b * lon + c` over the product of two axes.
///
/// Bilinear interpolation reproduces this exactly away from the seam.
pub fn linear_field(lats: &[f64], lons: &[f64], a: f64, b: f64, c: f64) -> Vec<f32> {
    let mut data = Vec::with_capacity(lats.len() * lons.len());
    for lat in lats {
        for lon in lons {
            data.push((a * lat + b * lon + c) as f32);
        }
    }
    data
}

/// Temperature-like field in Kelvin, warm at the equator and cold at the
/// poles, with a weak zonal wave.
pub fn temperature_field(lats: &[f64], lons: &[f64]) -> Vec<f32> {
    let mut data = Vec::with_capacity(lats.len() * lons.len());
    for lat in lats {
        for lon in lons {
            let base = 300.0 - 50.0 * (lat.to_radians().sin()).powi(2);
            let wave = 2.0 * (lon.to_radians() * 3.0).cos();
            data.push((base + wave) as f32);
        }
    }
    data
}

/// Octahedral-style reduced grid rows: `(latitude, points)` from north to
/// south, with `4 * i + 16` points on the i-th row from each pole.
///
/// # Example
///
/// ```
/// use test_utils::octahedral_rows;
///
/// let rows = octahedral_rows(4);
/// assert_eq!(rows.len(), 8);
/// assert_eq!(rows[0].1, 20);
/// assert_eq!(rows[3].1, 32);
/// assert_eq!(rows[4].1, 32);
/// ```
pub fn octahedral_rows(n: usize) -> Vec<(f64, usize)> {
    let total = 2 * n;
    let step = 180.0 / (total as f64 + 1.0);
    (0..total)
        .map(|i| {
            let lat = 90.0 - step * (i as f64 + 1.0);
            let from_pole = if i < n { i } else { total - 1 - i };
            (lat, 4 * (from_pole + 1) + 16)
        })
        .collect()
}

/// Grid description JSON keyed by one-based row number.
pub fn reduced_grid_json(rows: &[(f64, usize)]) -> String {
    let map: serde_json::Map<String, serde_json::Value> = rows
        .iter()
        .enumerate()
        .map(|(i, (lat, points))| {
            (
                (i + 1).to_string(),
                serde_json::json!({ "latitude": lat, "reduced_point": points }),
            )
        })
        .collect();
    serde_json::Value::Object(map).to_string()
}

/// Writes `{dir}/{name}.json` for `rows` and returns its path.
pub fn write_reduced_grid(dir: &Path, name: &str, rows: &[(f64, usize)]) -> PathBuf {
    let path = dir.join(format!("{}.json", name));
    std::fs::write(&path, reduced_grid_json(rows)).expect("Failed to write grid description");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_axes() {
        let lats = global_latitudes(2.5);
        assert_eq!(lats.len(), 73);
        assert_eq!(lats[0], 90.0);
        assert_eq!(*lats.last().unwrap(), -90.0);

        let lons = global_longitudes(2.5);
        assert_eq!(lons.len(), 144);
        assert_eq!(*lons.last().unwrap(), 357.5);
    }

    #[test]
    fn test_linear_field_layout() {
        let data = linear_field(&[10.0, 20.0], &[0.0, 1.0, 2.0], 1.0, 0.5, 3.0);
        assert_eq!(data, vec![13.0, 13.5, 14.0, 23.0, 23.5, 24.0]);
    }

    #[test]
    fn test_temperature_field_range() {
        let data = temperature_field(&global_latitudes(10.0), &global_longitudes(10.0));
        for v in data {
            assert!((240.0..=310.0).contains(&v), "value {} out of range", v);
        }
    }

    #[test]
    fn test_octahedral_rows_symmetric() {
        let rows = octahedral_rows(3);
        for i in 0..3 {
            assert_eq!(rows[i].1, rows[5 - i].1);
            assert!((rows[i].0 + rows[5 - i].0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reduced_grid_json_keys() {
        let json = reduced_grid_json(&[(45.0, 4), (-45.0, 4)]);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["1"]["latitude"], 45.0);
        assert_eq!(value["2"]["reduced_point"], 4);
    }
}
