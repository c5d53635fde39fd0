//! Reduced Gaussian grid descriptions and padded target grids.
//!
//! A reduced grid is described per latitude row: the row's latitude and how
//! many evenly spaced longitudes it carries. Rows near the poles carry fewer
//! points, so the grid is stored as a rectangle padded with NaN plus a
//! validity mask.

use std::collections::HashMap;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use grid_common::linspace_exclusive;

use super::GridExtent;
use crate::error::{RegridError, Result};

/// One latitude row of a reduced grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub latitude: f64,
    pub reduced_point: usize,
}

/// Ordered rows of a reduced Gaussian grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridInfo {
    rows: Vec<GridRow>,
}

impl GridInfo {
    pub fn from_rows(rows: Vec<GridRow>) -> Self {
        Self { rows }
    }

    /// Parse the JSON form `{"1": {"latitude": .., "reduced_point": ..}, ...}`.
    ///
    /// Rows are taken in key order `"1"` to `"N"`; any gap is an error.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, GridRow> =
            serde_json::from_str(json).map_err(|e| RegridError::GridInfo(e.to_string()))?;

        let rows = (1..=raw.len())
            .map(|i| {
                raw.get(&i.to_string())
                    .copied()
                    .ok_or_else(|| RegridError::GridInfo(format!("missing row \"{}\"", i)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rows })
    }

    /// Load `{dir}/{name}.json`.
    pub fn load(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(format!("{}.json", name));
        debug!(path = %path.display(), "Loading reduced grid description");
        let json = std::fs::read_to_string(&path)
            .map_err(|e| RegridError::GridInfo(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// Longest row, i.e. the padded grid width.
    pub fn max_points(&self) -> usize {
        self.rows.iter().map(|r| r.reduced_point).max().unwrap_or(0)
    }

    /// Number of real points over all rows.
    pub fn total_points(&self) -> usize {
        self.rows.iter().map(|r| r.reduced_point).sum()
    }
}

/// Curvilinear grid over dimensions `(y, x)` with a validity mask.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGrid {
    pub latitude: Array2<f64>,
    pub longitude: Array2<f64>,
    pub mask: Array2<bool>,
}

impl TargetGrid {
    /// `(rows, width)`.
    pub fn shape(&self) -> (usize, usize) {
        self.latitude.dim()
    }

    /// Number of real (unpadded) points.
    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|v| **v).count()
    }

    /// `(lat, lon)` of every cell in row-major order, NaN for padding.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.latitude
            .iter()
            .zip(self.longitude.iter())
            .map(|(lat, lon)| (*lat, *lon))
            .collect()
    }
}

/// Build the padded target grid for `info` over the source extent.
///
/// Latitudes are clipped to the source's latitude range; each row gets
/// `reduced_point` longitudes over `[lon_min, lon_max)`.
pub fn create_target_grid(info: &GridInfo, extent: &GridExtent) -> Result<TargetGrid> {
    if info.rows.is_empty() {
        return Err(RegridError::degenerate("reduced grid has no rows"));
    }
    if let Some(pos) = info.rows.iter().position(|r| r.reduced_point == 0) {
        return Err(RegridError::degenerate(format!(
            "reduced grid row {} has no points",
            pos + 1
        )));
    }

    let n_lat = info.rows.len();
    let width = info.max_points();

    let mut latitude = Array2::from_elem((n_lat, width), f64::NAN);
    let mut longitude = Array2::from_elem((n_lat, width), f64::NAN);
    let mut mask = Array2::from_elem((n_lat, width), false);

    for (i, row) in info.rows.iter().enumerate() {
        let lat = row.latitude.clamp(extent.lat_min, extent.lat_max);
        let lons = linspace_exclusive(extent.lon_min, extent.lon_max, row.reduced_point);
        for (j, lon) in lons.into_iter().enumerate() {
            latitude[[i, j]] = lat;
            longitude[[i, j]] = lon;
            mask[[i, j]] = true;
        }
    }

    debug!(
        rows = n_lat,
        width = width,
        points = info.total_points(),
        "Created reduced target grid"
    );

    Ok(TargetGrid {
        latitude,
        longitude,
        mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> GridExtent {
        GridExtent {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    #[test]
    fn test_two_row_grid() {
        let info = GridInfo::from_json(
            r#"{"1": {"latitude": 0.0, "reduced_point": 4},
                "2": {"latitude": 10.0, "reduced_point": 2}}"#,
        )
        .unwrap();
        let grid = create_target_grid(&info, &extent(-90.0, 90.0, 0.0, 100.0)).unwrap();

        assert_eq!(grid.shape(), (2, 4));
        assert_eq!(grid.longitude.row(0).to_vec(), vec![0.0, 25.0, 50.0, 75.0]);
        assert_eq!(grid.longitude[[1, 0]], 0.0);
        assert_eq!(grid.longitude[[1, 1]], 50.0);
        assert!(grid.longitude[[1, 2]].is_nan());
        assert!(grid.longitude[[1, 3]].is_nan());
        assert!(grid.latitude[[1, 3]].is_nan());
        assert_eq!(grid.valid_count(), 6);
        assert_eq!(
            grid.mask.row(1).to_vec(),
            vec![true, true, false, false]
        );
    }

    #[test]
    fn test_latitudes_are_clipped() {
        let info = GridInfo::from_rows(vec![
            GridRow { latitude: 89.0, reduced_point: 2 },
            GridRow { latitude: -89.0, reduced_point: 2 },
        ]);
        let grid = create_target_grid(&info, &extent(-80.0, 80.0, 0.0, 360.0)).unwrap();
        assert_eq!(grid.latitude[[0, 0]], 80.0);
        assert_eq!(grid.latitude[[1, 1]], -80.0);
    }

    #[test]
    fn test_missing_row_key() {
        let err = GridInfo::from_json(
            r#"{"1": {"latitude": 0.0, "reduced_point": 4},
                "3": {"latitude": 10.0, "reduced_point": 2}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RegridError::GridInfo(_)));
    }

    #[test]
    fn test_degenerate_grids() {
        let empty = GridInfo::from_rows(vec![]);
        assert!(matches!(
            create_target_grid(&empty, &extent(0.0, 1.0, 0.0, 1.0)),
            Err(RegridError::DegenerateGrid(_))
        ));

        let zero_row = GridInfo::from_rows(vec![GridRow { latitude: 0.0, reduced_point: 0 }]);
        assert!(matches!(
            create_target_grid(&zero_row, &extent(0.0, 1.0, 0.0, 1.0)),
            Err(RegridError::DegenerateGrid(_))
        ));
    }

    #[test]
    fn test_padding_matches_row_counts() {
        let counts = [20usize, 16, 12, 8, 4, 1];
        let info = GridInfo::from_rows(
            counts
                .iter()
                .enumerate()
                .map(|(i, n)| GridRow { latitude: i as f64 * 10.0, reduced_point: *n })
                .collect(),
        );
        let grid = create_target_grid(&info, &extent(-90.0, 90.0, 0.0, 360.0)).unwrap();

        assert_eq!(grid.shape(), (counts.len(), 20));
        for (i, n) in counts.iter().enumerate() {
            let row = grid.mask.row(i);
            assert_eq!(row.iter().filter(|v| **v).count(), *n);
            assert!(row.iter().skip(*n).all(|v| !v));
        }
        assert_eq!(grid.valid_count(), info.total_points());
    }
}
