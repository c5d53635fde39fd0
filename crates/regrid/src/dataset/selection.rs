//! Label-based lookups on coordinate values.

use grid_common::is_close;

/// Position of the first coordinate value close to `label`.
pub fn label_index(values: &[f64], label: f64) -> Option<usize> {
    values.iter().position(|v| is_close(*v, label))
}

/// Positions of the coordinate values inside the closed interval `[min, max]`.
pub fn range_indices(values: &[f64], min: f64, max: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v >= min && **v <= max)
        .map(|(i, _)| i)
        .collect()
}
