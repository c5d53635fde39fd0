//! Numeric helpers for regular and reduced grid axes.

/// Relative tolerance used by [`is_close`].
pub const RTOL: f64 = 1e-5;

/// Absolute tolerance used by [`is_close`].
pub const ATOL: f64 = 1e-8;

/// Approximate float equality: `|a - b| <= ATOL + RTOL * |b|`.
///
/// Two NaNs are never close.
pub fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// Evenly spaced values in `[start, stop)` with the given step.
///
/// Mirrors the half-open convention of a numeric range: the number of values
/// is `ceil((stop - start) / step)`. Returns an empty vector for a zero or
/// non-finite step, or when the range is empty.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step == 0.0 || !step.is_finite() || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }

    let count = ((stop - start) / step).ceil();
    if count <= 0.0 {
        return Vec::new();
    }

    (0..count as usize).map(|i| start + i as f64 * step).collect()
}

/// `n` evenly spaced samples over `[start, stop)`, endpoint excluded.
pub fn linspace_exclusive(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let step = (stop - start) / n as f64;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Wrap a longitude into `[origin, origin + 360)`.
pub fn normalize_longitude(lon: f64, origin: f64) -> f64 {
    let wrapped = (lon - origin).rem_euclid(360.0);
    origin + wrapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_close() {
        assert!(is_close(0.25, 0.25));
        assert!(is_close(0.25, 0.250000001));
        assert!(!is_close(0.25, 0.5));
        assert!(!is_close(0.25, -0.25));
        assert!(!is_close(f64::NAN, f64::NAN));
    }

    #[test]
    fn test_arange_half_open() {
        assert_eq!(arange(0.0, 360.0, 90.0), vec![0.0, 90.0, 180.0, 270.0]);
        assert_eq!(arange(0.0, 360.0, 2.8).len(), 129);
        assert!(arange(0.0, 1.0, 0.0).is_empty());
        assert!(arange(1.0, 0.0, 0.5).is_empty());
    }

    #[test]
    fn test_linspace_exclusive() {
        assert_eq!(linspace_exclusive(0.0, 100.0, 4), vec![0.0, 25.0, 50.0, 75.0]);
        assert_eq!(linspace_exclusive(0.0, 100.0, 2), vec![0.0, 50.0]);
        assert!(linspace_exclusive(0.0, 100.0, 0).is_empty());
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(-10.0, 0.0), 350.0);
        assert_eq!(normalize_longitude(370.0, 0.0), 10.0);
        assert_eq!(normalize_longitude(5.0, 10.0), 365.0);
    }
}
