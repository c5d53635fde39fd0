//! Sparse interpolation operators.
//!
//! Weights are kept in coordinate (COO) form: each triple maps a source cell
//! (`col`) onto a destination cell (`row`) with a weight (`S`). Cells are
//! addressed by their row-major flat index within the grid shapes.

pub mod bilinear;
pub mod cache;

use ndarray::{Array2, ArrayView2};

use crate::error::{RegridError, Result};

pub use cache::{weights_file_name, WeightsCache};

/// Name recorded for bilinear operators.
pub const BILINEAR: &str = "bilinear";

/// A sparse linear map from a source grid onto a destination grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseWeights {
    pub src_shape: Vec<usize>,
    pub dst_shape: Vec<usize>,
    pub rows: Vec<u64>,
    pub cols: Vec<u64>,
    pub values: Vec<f64>,
    pub method: String,
}

impl SparseWeights {
    /// An empty operator between the given shapes.
    pub fn new(src_shape: Vec<usize>, dst_shape: Vec<usize>, method: impl Into<String>) -> Self {
        Self {
            src_shape,
            dst_shape,
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
            method: method.into(),
        }
    }

    /// Record a weight. Zero weights are dropped.
    pub fn push(&mut self, row: usize, col: usize, weight: f64) {
        if weight == 0.0 {
            return;
        }
        self.rows.push(row as u64);
        self.cols.push(col as u64);
        self.values.push(weight);
    }

    pub fn src_size(&self) -> usize {
        self.src_shape.iter().product()
    }

    pub fn dst_size(&self) -> usize {
        self.dst_shape.iter().product()
    }

    /// Number of stored weights.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Check that the triples are consistent and in bounds.
    pub fn validate(&self) -> Result<()> {
        if self.rows.len() != self.values.len() || self.cols.len() != self.values.len() {
            return Err(RegridError::weights(format!(
                "row/col/S lengths differ: {}/{}/{}",
                self.rows.len(),
                self.cols.len(),
                self.values.len()
            )));
        }

        let (src, dst) = (self.src_size() as u64, self.dst_size() as u64);
        if let Some(r) = self.rows.iter().find(|&&r| r >= dst) {
            return Err(RegridError::weights(format!(
                "destination index {} out of range for {} cells",
                r, dst
            )));
        }
        if let Some(c) = self.cols.iter().find(|&&c| c >= src) {
            return Err(RegridError::weights(format!(
                "source index {} out of range for {} cells",
                c, src
            )));
        }
        Ok(())
    }

    /// Reject an operator built for different grids.
    pub fn check_shapes(&self, src_shape: &[usize], dst_shape: &[usize]) -> Result<()> {
        if self.src_shape != src_shape || self.dst_shape != dst_shape {
            return Err(RegridError::weights(format!(
                "weights map {:?} -> {:?} but grids are {:?} -> {:?}",
                self.src_shape, self.dst_shape, src_shape, dst_shape
            )));
        }
        Ok(())
    }

    /// Apply to one flattened source field.
    ///
    /// Destination cells without any weight are NaN; NaN in a contributing
    /// source cell propagates.
    pub fn apply(&self, src: &[f64]) -> Result<Vec<f64>> {
        if src.len() != self.src_size() {
            return Err(RegridError::shape_mismatch(format!(
                "source field has {} cells, weights expect {}",
                src.len(),
                self.src_size()
            )));
        }

        let mut dst = vec![0.0; self.dst_size()];
        let mut covered = vec![false; self.dst_size()];
        for ((&r, &c), &w) in self.rows.iter().zip(&self.cols).zip(&self.values) {
            let (r, c) = (r as usize, c as usize);
            dst[r] += w * src[c];
            covered[r] = true;
        }

        for (value, hit) in dst.iter_mut().zip(covered) {
            if !hit {
                *value = f64::NAN;
            }
        }
        Ok(dst)
    }

    /// Apply to a batch of fields laid out as `(batch, src_size)`.
    pub fn apply_batch(&self, fields: ArrayView2<f64>) -> Result<Array2<f64>> {
        let (batch, _) = fields.dim();
        let mut out = Array2::from_elem((batch, self.dst_size()), f64::NAN);
        for (i, field) in fields.outer_iter().enumerate() {
            let src: Vec<f64> = field.iter().copied().collect();
            let dst = self.apply(&src)?;
            out.row_mut(i)
                .iter_mut()
                .zip(dst)
                .for_each(|(o, v)| *o = v);
        }
        Ok(out)
    }
}
