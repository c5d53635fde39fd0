//! Bilinear weight computation.
//!
//! Two source layouts are supported: a regular grid of 1D latitude and
//! longitude axes, and a reduced grid of points grouped into latitude rows.

use grid_common::{is_close, normalize_longitude};

use super::{SparseWeights, BILINEAR};
use crate::error::{RegridError, Result};

/// Bracketing positions on an axis and the fractional offset between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lo: usize,
    pub hi: usize,
    pub frac: f64,
}

/// Locate `x` on a monotonic axis (ascending or descending).
///
/// Returns `None` for NaN or for values outside the axis range. Values
/// within tolerance of an end point snap onto it.
pub fn bracket(axis: &[f64], x: f64) -> Option<Bracket> {
    let n = axis.len();
    if n == 0 || x.is_nan() {
        return None;
    }

    let (first, last) = (axis[0], axis[n - 1]);
    if is_close(x, first) {
        return Some(Bracket { lo: 0, hi: 0, frac: 0.0 });
    }
    if is_close(x, last) {
        return Some(Bracket { lo: n - 1, hi: n - 1, frac: 0.0 });
    }

    let ascending = last >= first;
    let k = if ascending {
        axis.partition_point(|v| *v <= x)
    } else {
        axis.partition_point(|v| *v >= x)
    };

    if k == 0 || k == n {
        return None;
    }

    let (a0, a1) = (axis[k - 1], axis[k]);
    Some(Bracket {
        lo: k - 1,
        hi: k,
        frac: (x - a0) / (a1 - a0),
    })
}

/// Locate a longitude on an ascending longitude axis.
///
/// `lon` is first wrapped into `[axis[0], axis[0] + 360)`. When the axis
/// covers the globe, values past the last column bracket across the seam
/// onto column 0.
pub fn bracket_longitude(axis: &[f64], lon: f64) -> Option<Bracket> {
    let n = axis.len();
    if n < 2 || axis[n - 1] < axis[0] {
        return bracket(axis, lon);
    }

    let (first, last) = (axis[0], axis[n - 1]);
    let x = normalize_longitude(lon, first);
    if let Some(found) = bracket(axis, x) {
        return Some(found);
    }

    let gap = first + 360.0 - last;
    let step = (last - first) / (n - 1) as f64;
    if x > last && gap > 0.0 && (gap <= step || is_close(gap, step)) {
        return Some(Bracket {
            lo: n - 1,
            hi: 0,
            frac: (x - last) / gap,
        });
    }
    None
}

/// Weights from a regular `(lat, lon)` source onto arbitrary points.
///
/// `points` are `(lat, lon)` pairs in destination row-major order; NaN pairs
/// (padding) and points outside the source extent receive no weights.
/// Longitudes are matched modulo 360.
pub fn regular_to_points(
    src_lat: &[f64],
    src_lon: &[f64],
    points: &[(f64, f64)],
    dst_shape: Vec<usize>,
) -> Result<SparseWeights> {
    if src_lat.is_empty() || src_lon.is_empty() {
        return Err(RegridError::degenerate(format!(
            "source grid is {}x{}",
            src_lat.len(),
            src_lon.len()
        )));
    }
    let dst_size: usize = dst_shape.iter().product();
    if dst_size == 0 {
        return Err(RegridError::degenerate(format!(
            "destination grid shape {:?} is empty",
            dst_shape
        )));
    }
    if points.len() != dst_size {
        return Err(RegridError::shape_mismatch(format!(
            "{} destination points for shape {:?}",
            points.len(),
            dst_shape
        )));
    }

    let n_lon = src_lon.len();
    let mut weights = SparseWeights::new(vec![src_lat.len(), n_lon], dst_shape, BILINEAR);

    for (dst, &(lat, lon)) in points.iter().enumerate() {
        let (Some(y), Some(x)) = (bracket(src_lat, lat), bracket_longitude(src_lon, lon)) else {
            continue;
        };

        let cell = |i: usize, j: usize| i * n_lon + j;
        let corners = [
            (cell(y.lo, x.lo), (1.0 - y.frac) * (1.0 - x.frac)),
            (cell(y.lo, x.hi), (1.0 - y.frac) * x.frac),
            (cell(y.hi, x.lo), y.frac * (1.0 - x.frac)),
            (cell(y.hi, x.hi), y.frac * x.frac),
        ];
        push_merged(&mut weights, dst, &corners);
    }

    Ok(weights)
}

/// A latitude row of a reduced source grid, longitudes ascending.
#[derive(Debug, Clone)]
struct SourceRow {
    latitude: f64,
    /// `(longitude, flat point index)` sorted by longitude.
    points: Vec<(f64, usize)>,
}

impl SourceRow {
    /// Cyclic bracketing of `lon` within the row.
    fn weights_at(&self, lon: f64) -> Vec<(usize, f64)> {
        let n = self.points.len();
        if n == 1 {
            return vec![(self.points[0].1, 1.0)];
        }

        let origin = self.points[0].0;
        let x = normalize_longitude(lon, origin);
        let k = self.points.partition_point(|(l, _)| *l <= x);

        let (lon0, p0) = self.points[k - 1];
        let (lon1, p1) = if k == n {
            (self.points[0].0 + 360.0, self.points[0].1)
        } else {
            self.points[k]
        };

        let frac = if lon1 == lon0 { 0.0 } else { (x - lon0) / (lon1 - lon0) };
        vec![(p0, 1.0 - frac), (p1, frac)]
    }
}

fn group_rows(lat: &[f64], lon: &[f64]) -> Vec<SourceRow> {
    let mut rows: Vec<SourceRow> = Vec::new();
    for (i, (&la, &lo)) in lat.iter().zip(lon).enumerate() {
        if !la.is_finite() || !lo.is_finite() {
            continue;
        }
        match rows.iter_mut().find(|r| is_close(la, r.latitude)) {
            Some(row) => row.points.push((lo, i)),
            None => rows.push(SourceRow {
                latitude: la,
                points: vec![(lo, i)],
            }),
        }
    }

    for row in &mut rows {
        row.points.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    rows.sort_by(|a, b| a.latitude.total_cmp(&b.latitude));
    rows
}

/// Weights from a reduced point grid onto a regular `(lat, lon)` grid.
///
/// The destination point is bracketed between two latitude rows, cyclically
/// within each row, and the two row estimates are combined linearly in
/// latitude. Points poleward of the outermost row use that row alone.
pub fn reduced_to_regular(
    src_lat: &[f64],
    src_lon: &[f64],
    dst_lat: &[f64],
    dst_lon: &[f64],
) -> Result<SparseWeights> {
    if src_lat.len() != src_lon.len() {
        return Err(RegridError::shape_mismatch(format!(
            "{} latitudes for {} longitudes",
            src_lat.len(),
            src_lon.len()
        )));
    }

    let rows = group_rows(src_lat, src_lon);
    if rows.is_empty() {
        return Err(RegridError::degenerate("source grid has no valid points"));
    }
    if dst_lat.is_empty() || dst_lon.is_empty() {
        return Err(RegridError::degenerate(format!(
            "destination grid is {}x{}",
            dst_lat.len(),
            dst_lon.len()
        )));
    }

    let row_lats: Vec<f64> = rows.iter().map(|r| r.latitude).collect();
    let mut weights = SparseWeights::new(
        vec![src_lat.len()],
        vec![dst_lat.len(), dst_lon.len()],
        BILINEAR,
    );

    for (i, &lat) in dst_lat.iter().enumerate() {
        let (lo, hi, fy) = if lat <= row_lats[0] {
            (0, 0, 0.0)
        } else if lat >= row_lats[row_lats.len() - 1] {
            (rows.len() - 1, rows.len() - 1, 0.0)
        } else {
            match bracket(&row_lats, lat) {
                Some(b) => (b.lo, b.hi, b.frac),
                None => continue,
            }
        };

        for (j, &lon) in dst_lon.iter().enumerate() {
            let mut contributions: Vec<(usize, f64)> = rows[lo]
                .weights_at(lon)
                .into_iter()
                .map(|(p, w)| (p, w * (1.0 - fy)))
                .collect();
            if hi != lo {
                contributions.extend(
                    rows[hi]
                        .weights_at(lon)
                        .into_iter()
                        .map(|(p, w)| (p, w * fy)),
                );
            }
            push_merged(&mut weights, i * dst_lon.len() + j, &contributions);
        }
    }

    Ok(weights)
}

/// Push contributions for one destination cell, summing repeated sources.
fn push_merged(weights: &mut SparseWeights, dst: usize, contributions: &[(usize, f64)]) {
    let mut merged: Vec<(usize, f64)> = Vec::with_capacity(contributions.len());
    for &(src, w) in contributions {
        match merged.iter_mut().find(|(s, _)| *s == src) {
            Some((_, acc)) => *acc += w,
            None => merged.push((src, w)),
        }
    }
    for (src, w) in merged {
        weights.push(dst, src, w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    fn linear(lat: f64, lon: f64) -> f64 {
        2.0 * lat + 0.5 * lon
    }

    #[test]
    fn test_bracket_ascending_and_descending() {
        let asc = [0.0, 10.0, 20.0];
        let b = bracket(&asc, 15.0).unwrap();
        assert_eq!((b.lo, b.hi), (1, 2));
        assert!((b.frac - 0.5).abs() < 1e-12);

        let desc = [20.0, 10.0, 0.0];
        let b = bracket(&desc, 15.0).unwrap();
        assert_eq!((b.lo, b.hi), (0, 1));
        assert!((b.frac - 0.5).abs() < 1e-12);

        assert!(bracket(&asc, -1.0).is_none());
        assert!(bracket(&asc, 21.0).is_none());
        assert!(bracket(&asc, f64::NAN).is_none());
        assert_eq!(bracket(&asc, 20.0).unwrap().lo, 2);
    }

    #[test]
    fn test_regular_reproduces_linear_field() {
        let lat: Vec<f64> = (0..7).map(|i| -30.0 + i as f64 * 10.0).collect();
        let lon: Vec<f64> = (0..10).map(|i| i as f64 * 10.0).collect();
        let src: Vec<f64> = lat
            .iter()
            .flat_map(|la| lon.iter().map(move |lo| linear(*la, *lo)))
            .collect();

        let points = vec![(-25.0, 5.0), (12.5, 47.5), (0.0, 90.0), (29.9, 0.1)];
        let w = regular_to_points(&lat, &lon, &points, vec![points.len()]).unwrap();
        let out = w.apply(&src).unwrap();

        for (value, (la, lo)) in out.iter().zip(&points) {
            assert!((value - linear(*la, *lo)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_regular_outside_and_padding_are_nan() {
        let lat = [0.0, 10.0];
        let lon = [0.0, 10.0];
        let points = [(5.0, 5.0), (20.0, 5.0), (f64::NAN, f64::NAN)];
        let w = regular_to_points(&lat, &lon, &points, vec![3]).unwrap();
        let out = w.apply(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
    }

    #[test]
    fn test_longitude_bracket_wraps_and_crosses_seam() {
        let lon: Vec<f64> = (0..72).map(|j| -180.0 + 5.0 * j as f64).collect();

        let b = bracket_longitude(&lon, 190.0).unwrap();
        assert_eq!(b.lo, 2);
        assert_approx_eq!(b.frac, 0.0, 1e-12);

        let b = bracket_longitude(&lon, 177.5).unwrap();
        assert_eq!((b.lo, b.hi), (71, 0));
        assert_approx_eq!(b.frac, 0.5, 1e-12);

        // A regional axis has no seam.
        assert!(bracket_longitude(&[0.0, 10.0], 350.0).is_none());
        assert!(bracket_longitude(&[0.0, 10.0], 365.0).is_some());
    }

    #[test]
    fn test_regular_global_source_in_other_frame() {
        let lat = [-10.0, 0.0, 10.0];
        let lon: Vec<f64> = (0..72).map(|j| -180.0 + 5.0 * j as f64).collect();
        let points: Vec<(f64, f64)> = (0..36).map(|j| (0.0, 10.0 * j as f64 + 2.5)).collect();

        let w = regular_to_points(&lat, &lon, &points, vec![36]).unwrap();
        let src: Vec<f64> = (0..lat.len())
            .flat_map(|_| lon.iter().map(|l| normalize_longitude(*l, 0.0)))
            .collect();
        let out = w.apply(&src).unwrap();

        assert!(out.iter().all(|v| !v.is_nan()));
        for (value, (_, dst_lon)) in out.iter().zip(&points) {
            // No point falls in the 355..360 cell where the field jumps.
            assert_approx_eq!(*value, *dst_lon, 1e-9);
        }
    }

    #[test]
    fn test_regular_degenerate() {
        assert!(matches!(
            regular_to_points(&[], &[0.0], &[], vec![0]),
            Err(RegridError::DegenerateGrid(_))
        ));
        assert!(matches!(
            regular_to_points(&[0.0], &[0.0], &[], vec![0, 4]),
            Err(RegridError::DegenerateGrid(_))
        ));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let lat = [0.0, 1.0, 2.0];
        let lon = [0.0, 1.0, 2.0];
        let points = [(0.3, 1.7), (1.0, 1.0), (2.0, 0.5)];
        let w = regular_to_points(&lat, &lon, &points, vec![3]).unwrap();
        for dst in 0..3u64 {
            let total: f64 = w
                .rows
                .iter()
                .zip(&w.values)
                .filter(|(r, _)| **r == dst)
                .map(|(_, v)| v)
                .sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reduced_rows_and_seam() {
        // Two rows: 4 points at lat 0, 2 points at lat 10.
        let src_lat = [0.0, 0.0, 0.0, 0.0, 10.0, 10.0];
        let src_lon = [0.0, 90.0, 180.0, 270.0, 0.0, 180.0];
        let values = [0.0, 90.0, 180.0, 270.0, 1000.0, 1180.0];

        let w = reduced_to_regular(&src_lat, &src_lon, &[0.0, 5.0, 10.0, 20.0], &[45.0, 315.0])
            .unwrap();
        assert_eq!(w.dst_shape, vec![4, 2]);
        let out = w.apply(&values).unwrap();

        // Row 0 at lon 45 is halfway between 0 and 90.
        assert!((out[0] - 45.0).abs() < 1e-9);
        // Seam: lon 315 between 270 and 360 (wraps to 0).
        assert!((out[1] - 135.0).abs() < 1e-9);
        // Lat 5 blends rows equally: (45 + 1045) / 2.
        assert!((out[2] - 545.0).abs() < 1e-9);
        // Lat 10 uses the last row alone.
        assert!((out[4] - 1045.0).abs() < 1e-9);
        // Poleward of the last row, clamped onto it.
        assert!((out[6] - 1045.0).abs() < 1e-9);
    }

    #[test]
    fn test_reduced_degenerate() {
        assert!(matches!(
            reduced_to_regular(&[], &[], &[0.0], &[0.0]),
            Err(RegridError::DegenerateGrid(_))
        ));
        assert!(matches!(
            reduced_to_regular(&[0.0], &[0.0], &[], &[0.0]),
            Err(RegridError::DegenerateGrid(_))
        ));
    }
}
