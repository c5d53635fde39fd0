//! Integration tests for the store-to-store pipelines.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use regrid::{
    DataArray, Dataset, GaussianRegridder, LatLonRegridder, RegridConfig, ZarrDatasetReader,
    ZarrDatasetWriter,
};
use regrid_cli::{check_output, rechunk_store, regrid_store, staging_path};
use tempfile::TempDir;
use test_utils::{
    global_latitudes, global_longitudes, linear_field, octahedral_rows, temp_test_dir,
    write_reduced_grid,
};

/// Writes a 10 degree global `t2m` store and returns its path.
fn input_store(dir: &Path) -> PathBuf {
    let lats = global_latitudes(10.0);
    let lons = global_longitudes(10.0);
    let field = linear_field(&lats, &lons, 2.0, 0.1, 250.0);
    let data = Array2::from_shape_vec((lats.len(), lons.len()), field).unwrap();

    let mut ds = Dataset::new();
    ds.insert_coord(DataArray::from_vec("latitude", "latitude", lats))
        .unwrap();
    ds.insert_coord(DataArray::from_vec("longitude", "longitude", lons))
        .unwrap();
    let mut t2m = DataArray::new("t2m", ["latitude", "longitude"], data.into_dyn()).unwrap();
    t2m.attrs.insert("units".into(), "K".into());
    ds.insert_var(t2m).unwrap();

    let path = dir.join("input.zarr");
    ZarrDatasetWriter::new(RegridConfig::default())
        .write(&ds, &path)
        .unwrap();
    path
}

fn config(dir: &TempDir) -> RegridConfig {
    RegridConfig {
        weights_dir: dir.path().to_path_buf(),
        grid_info_dir: dir.path().to_path_buf(),
        ..RegridConfig::default()
    }
}

#[test]
fn test_check_output() {
    let dir = temp_test_dir();
    let input = input_store(dir.path());
    let path = dir.path().join("out.zarr");
    assert!(check_output(&input, &path, false).is_ok());

    std::fs::create_dir_all(path.join("t2m")).unwrap();
    assert!(check_output(&input, &path, false).is_err());
    assert!(check_output(&input, &path, true).is_ok());
    assert!(path.exists());

    assert!(check_output(&input, &input, true).is_err());
    let aliased = dir.path().join(".").join("input.zarr");
    assert!(check_output(&input, &aliased, true).is_err());
}

#[test]
fn test_latlon_coarsening() {
    let dir = temp_test_dir();
    let config = config(&dir);
    let input = input_store(dir.path());
    let output = dir.path().join("coarse.zarr");

    let regridder = LatLonRegridder::new(Some(20.0))
        .with_config(config.clone())
        .with_weights_dir(dir.path());
    let summary = regrid_store(&regridder, &input, &output, None, false, &config).unwrap();
    assert_eq!(summary.arrays, 3);

    let reader = ZarrDatasetReader::open(&output).unwrap();
    assert_eq!(reader.dims().get("latitude"), Some(&9));
    assert_eq!(reader.dims().get("longitude"), Some(&18));
    assert_eq!(reader.data_var("t2m").unwrap().units(), Some("K"));
    assert!(dir.path().join("regrid_weights_10.00_to_20.zarr").exists());
}

#[test]
fn test_existing_output_requires_overwrite() {
    let dir = temp_test_dir();
    let config = config(&dir);
    let input = input_store(dir.path());
    let output = dir.path().join("copy.zarr");
    let regridder = LatLonRegridder::new(None);

    regrid_store(&regridder, &input, &output, None, false, &config).unwrap();
    assert!(regrid_store(&regridder, &input, &output, None, false, &config).is_err());
    regrid_store(&regridder, &input, &output, None, true, &config).unwrap();

    let back = ZarrDatasetReader::open(&output).unwrap().read_dataset().unwrap();
    let original = ZarrDatasetReader::open(&input).unwrap().read_dataset().unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_failed_overwrite_keeps_previous_output() {
    let dir = temp_test_dir();
    let config = config(&dir);
    let input = input_store(dir.path());
    let output = dir.path().join("copy.zarr");
    regrid_store(&LatLonRegridder::new(None), &input, &output, None, false, &config).unwrap();

    write_reduced_grid(dir.path(), "EMPTY", &[(0.0, 0)]);
    let broken = GaussianRegridder::from_config("EMPTY", &config).unwrap();
    assert!(regrid_store(&broken, &input, &output, None, true, &config).is_err());

    let kept = ZarrDatasetReader::open(&output).unwrap().read_dataset().unwrap();
    let original = ZarrDatasetReader::open(&input).unwrap().read_dataset().unwrap();
    assert_eq!(kept, original);
    assert!(!staging_path(&output).unwrap().exists());
}

#[test]
fn test_gaussian_pipeline() {
    let dir = temp_test_dir();
    let config = config(&dir);
    let input = input_store(dir.path());
    let output = dir.path().join("o4.zarr");
    write_reduced_grid(dir.path(), "O4", &octahedral_rows(4));

    let regridder = GaussianRegridder::from_config("O4", &config).unwrap();
    regrid_store(&regridder, &input, &output, Some("point=-1"), false, &config).unwrap();

    let reader = ZarrDatasetReader::open(&output).unwrap();
    assert_eq!(reader.dims().get("point"), Some(&208));
    assert_eq!(reader.data_var("t2m").unwrap().dims, vec!["point"]);
}

#[test]
fn test_missing_input_fails() {
    let dir = temp_test_dir();
    let config = config(&dir);
    let output = dir.path().join("out.zarr");

    let result = regrid_store(
        &LatLonRegridder::new(None),
        &dir.path().join("missing.zarr"),
        &output,
        None,
        false,
        &config,
    );
    assert!(result.is_err());
}

#[test]
fn test_rechunk_store() {
    let dir = temp_test_dir();
    let config = config(&dir);
    let input = input_store(dir.path());
    let output = dir.path().join("rechunked.zarr");

    assert!(rechunk_store(&input, &output, "latitude=0", false, &config).is_err());
    assert!(!output.exists());

    rechunk_store(&input, &output, "latitude=5,longitude=-1", false, &config).unwrap();
    let back = ZarrDatasetReader::open(&output).unwrap().read_dataset().unwrap();
    let original = ZarrDatasetReader::open(&input).unwrap().read_dataset().unwrap();
    assert_eq!(back, original);
    assert!(!staging_path(&output).unwrap().exists());
}

#[test]
fn test_rechunk_onto_input_rejected() {
    let dir = temp_test_dir();
    let config = config(&dir);
    let input = input_store(dir.path());

    assert!(rechunk_store(&input, &input, "latitude=5", true, &config).is_err());
    let still = ZarrDatasetReader::open(&input).unwrap().read_dataset().unwrap();
    assert_eq!(still.var("t2m").unwrap().dims.len(), 2);
}
