//! Durable storage for interpolation weights.
//!
//! A weights artifact is a Zarr group holding `row`, `col` (`u64`) and `S`
//! (`f64`) arrays, with the source shape, destination shape and method in
//! the group attributes. Artifacts are created once and reused; there is no
//! locking between concurrent writers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use zarrs::group::Group;
use zarrs_filesystem::FilesystemStore;

use super::SparseWeights;
use crate::config::RegridConfig;
use crate::dataset::Attributes;
use crate::error::{RegridError, Result};
use crate::reader::{read_f64, read_u64};
use crate::writer::{write_group, Elements, ZarrDatasetWriter, DIMENSIONS_ATTR};

const ROW: &str = "row";
const COL: &str = "col";
const WEIGHT: &str = "S";
/// Dimension of the weight triples.
const N_S: &str = "n_s";

/// File name for weights from a source resolution to a target grid.
pub fn weights_file_name(source_resolution: f64, target: &str) -> String {
    format!("regrid_weights_{:.2}_to_{}.zarr", source_resolution, target)
}

/// Weights artifacts kept under one directory.
#[derive(Debug, Clone)]
pub struct WeightsCache {
    dir: PathBuf,
    config: RegridConfig,
}

impl WeightsCache {
    pub fn new(dir: impl Into<PathBuf>, config: RegridConfig) -> Self {
        Self {
            dir: dir.into(),
            config,
        }
    }

    /// Cache rooted at the configured weights directory.
    pub fn from_config(config: &RegridConfig) -> Self {
        Self::new(config.weights_dir.clone(), config.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Load `file_name` if present, otherwise compute and persist it.
    pub fn load_or_compute<F>(
        &self,
        file_name: &str,
        src_shape: &[usize],
        dst_shape: &[usize],
        compute: F,
    ) -> Result<SparseWeights>
    where
        F: FnOnce() -> Result<SparseWeights>,
    {
        load_or_compute(&self.path_for(file_name), src_shape, dst_shape, &self.config, compute)
    }
}

/// Load the artifact at `path` if present, otherwise compute and persist it.
///
/// A loaded artifact whose shapes differ from the grids in hand is rejected.
pub fn load_or_compute<F>(
    path: &Path,
    src_shape: &[usize],
    dst_shape: &[usize],
    config: &RegridConfig,
    compute: F,
) -> Result<SparseWeights>
where
    F: FnOnce() -> Result<SparseWeights>,
{
    if path.exists() {
        info!(path = %path.display(), "Loading existing regridder weights");
        let weights = load_weights(path)?;
        weights.check_shapes(src_shape, dst_shape)?;
        return Ok(weights);
    }

    info!(path = %path.display(), "Computing regridder weights");
    let weights = compute()?;
    weights.check_shapes(src_shape, dst_shape)?;
    save_weights(&weights, path, config)?;
    info!(path = %path.display(), nnz = weights.nnz(), "Saved regridder weights");
    Ok(weights)
}

/// Persist weights as a Zarr group at `path`.
///
/// The group is written beside `path` and renamed into place, so a failed
/// write never leaves a partial artifact at `path`.
pub fn save_weights(weights: &SparseWeights, path: &Path, config: &RegridConfig) -> Result<()> {
    weights.validate()?;
    write_staged(path, |staging| write_weights(weights, staging, config))
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

fn write_staged<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let staging = staging_path(path);
    if staging.exists() {
        warn!(path = %staging.display(), "Removing stale partial weights");
        std::fs::remove_dir_all(&staging)?;
    }

    if let Err(err) = write(&staging) {
        if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
            if staging.exists() {
                warn!(error = %cleanup, path = %staging.display(), "Failed to remove partial weights");
            }
        }
        return Err(err);
    }

    if let Err(err) = std::fs::rename(&staging, path) {
        std::fs::remove_dir_all(&staging)?;
        if path.exists() {
            // Another writer finished first.
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn write_weights(weights: &SparseWeights, path: &Path, config: &RegridConfig) -> Result<()> {
    std::fs::create_dir_all(path)?;
    let store = Arc::new(
        FilesystemStore::new(path).map_err(|e| RegridError::StorageError(e.to_string()))?,
    );

    let mut attrs = Attributes::new();
    attrs.insert("src_shape".to_string(), json!(weights.src_shape));
    attrs.insert("dst_shape".to_string(), json!(weights.dst_shape));
    attrs.insert("method".to_string(), json!(weights.method));
    write_group(&store, attrs)?;

    let writer = ZarrDatasetWriter::new(config.clone());
    let n = weights.nnz();
    let chunks = vec![n.max(1) as u64];
    let mut dims = Attributes::new();
    dims.insert(DIMENSIONS_ATTR.to_string(), json!([N_S]));

    writer.write_elements(&store, ROW, &[n], chunks.clone(), dims.clone(), Elements::U64(&weights.rows))?;
    writer.write_elements(&store, COL, &[n], chunks.clone(), dims.clone(), Elements::U64(&weights.cols))?;
    writer.write_elements(&store, WEIGHT, &[n], chunks, dims, Elements::F64(&weights.values))?;
    Ok(())
}

/// Load weights previously written by [`save_weights`].
pub fn load_weights(path: &Path) -> Result<SparseWeights> {
    let store = Arc::new(
        FilesystemStore::new(path).map_err(|e| RegridError::StorageError(e.to_string()))?,
    );

    let group = Group::open(store.clone(), "/")
        .map_err(|e| RegridError::weights(format!("{}: {}", path.display(), e)))?;
    let attrs = group.attributes();

    let shape_attr = |key: &str| -> Result<Vec<usize>> {
        let value = attrs
            .get(key)
            .cloned()
            .ok_or_else(|| RegridError::weights(format!("missing '{}' attribute", key)))?;
        Ok(serde_json::from_value(value)?)
    };

    let weights = SparseWeights {
        src_shape: shape_attr("src_shape")?,
        dst_shape: shape_attr("dst_shape")?,
        rows: read_u64(&store, ROW)?,
        cols: read_u64(&store, COL)?,
        values: read_f64(&store, WEIGHT)?,
        method: attrs
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or(super::BILINEAR)
            .to_string(),
    };
    weights.validate()?;
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZarrCompression;
    use crate::weights::BILINEAR;

    fn sample() -> SparseWeights {
        let mut w = SparseWeights::new(vec![2, 2], vec![3], BILINEAR);
        w.push(0, 0, 0.5);
        w.push(0, 3, 0.5);
        w.push(2, 1, 1.0);
        w
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            weights_file_name(0.25, "N320"),
            "regrid_weights_0.25_to_N320.zarr"
        );
        assert_eq!(
            weights_file_name(1.0 / 3.0, "1.5"),
            "regrid_weights_0.33_to_1.5.zarr"
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.zarr");
        let config = RegridConfig {
            zarr_compression: ZarrCompression::None,
            ..Default::default()
        };

        save_weights(&sample(), &path, &config).unwrap();
        assert_eq!(load_weights(&path).unwrap(), sample());
    }

    #[test]
    fn test_failed_write_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.zarr");

        let result = write_staged(&path, |staging| {
            std::fs::create_dir_all(staging.join(ROW))?;
            Err(RegridError::StorageError("disk full".into()))
        });
        assert!(result.is_err());
        assert!(!path.exists());
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_stale_partial_weights_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.zarr");
        std::fs::create_dir_all(staging_path(&path).join("junk")).unwrap();

        save_weights(&sample(), &path, &RegridConfig::default()).unwrap();
        assert_eq!(load_weights(&path).unwrap(), sample());
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_load_or_compute_reuses_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeightsCache::new(dir.path(), RegridConfig::default());

        let first = cache
            .load_or_compute("w.zarr", &[2, 2], &[3], || Ok(sample()))
            .unwrap();
        let second = cache
            .load_or_compute("w.zarr", &[2, 2], &[3], || {
                Err(RegridError::weights("should not recompute"))
            })
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeightsCache::new(dir.path(), RegridConfig::default());
        cache
            .load_or_compute("w.zarr", &[2, 2], &[3], || Ok(sample()))
            .unwrap();

        let err = cache
            .load_or_compute("w.zarr", &[4, 4], &[3], || Ok(sample()))
            .unwrap_err();
        assert!(matches!(err, RegridError::Weights(_)));
    }
}
