//! Store-to-store pipelines behind the `regrid` subcommands.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use regrid::{
    parse_chunk_specs, rechunk, RegridConfig, Regridder, ZarrDatasetReader, ZarrDatasetWriter,
    ZarrWriteSummary,
};
use tracing::{info, warn};

/// Check that a new store may be written at `output`.
///
/// An existing output is an error unless `overwrite` is set. An output that
/// resolves to the input is always an error.
pub fn check_output(input: &Path, output: &Path, overwrite: bool) -> Result<()> {
    if !output.exists() {
        return Ok(());
    }
    if !overwrite {
        bail!(
            "{} already exists; pass --overwrite to replace it",
            output.display()
        );
    }

    let same = match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        bail!("Output {} is the input store", output.display());
    }
    Ok(())
}

/// Sibling path a store is written to before it replaces `output`.
pub fn staging_path(output: &Path) -> Result<PathBuf> {
    let name = output
        .file_name()
        .with_context(|| format!("Output {} has no file name", output.display()))?;
    Ok(output.with_file_name(format!(".{}.partial", name.to_string_lossy())))
}

/// Run `write` against a staging path and move the result to `output` only
/// once it succeeds. A failed write leaves any existing output in place.
fn write_staged<T>(output: &Path, write: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let staging = staging_path(output)?;
    if staging.exists() {
        warn!(path = %staging.display(), "Removing stale staging store");
        remove_path(&staging)?;
    }

    let value = match write(&staging) {
        Ok(value) => value,
        Err(err) => {
            if staging.exists() {
                if let Err(cleanup) = remove_path(&staging) {
                    warn!(error = %cleanup, path = %staging.display(), "Failed to clean up staging store");
                }
            }
            return Err(err);
        }
    };

    if output.exists() {
        warn!(path = %output.display(), "Replacing existing output");
        remove_path(output)?;
    }
    fs::rename(&staging, output).with_context(|| {
        format!(
            "Failed to move {} to {}",
            staging.display(),
            output.display()
        )
    })?;
    Ok(value)
}

fn remove_path(path: &Path) -> Result<()> {
    let removed = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.with_context(|| format!("Failed to remove {}", path.display()))
}

/// Read `input`, regrid it and write the result to `output`.
///
/// `chunks` is a `dim=size` list; unnamed dimensions use the configured
/// chunk edge.
pub fn regrid_store(
    regridder: &dyn Regridder,
    input: &Path,
    output: &Path,
    chunks: Option<&str>,
    overwrite: bool,
    config: &RegridConfig,
) -> Result<ZarrWriteSummary> {
    let writer = writer(config, chunks)?;
    check_output(input, output, overwrite)?;

    let start = Instant::now();
    let ds = ZarrDatasetReader::open(input)
        .and_then(|reader| reader.read_dataset())
        .with_context(|| format!("Failed to read {}", input.display()))?;
    info!(
        input = %input.display(),
        variables = ds.data_vars.len(),
        dims = ?ds.dims(),
        "Loaded input dataset"
    );

    let regridded = regridder.regrid(ds).context("Regridding failed")?;
    let summary = write_staged(output, |staging| {
        writer
            .write(&regridded, staging)
            .with_context(|| format!("Failed to write {}", output.display()))
    })?;

    info!(
        output = %output.display(),
        arrays = summary.arrays,
        bytes = summary.bytes_written,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Wrote regridded dataset"
    );
    Ok(summary)
}

/// Copy `input` to `output` with new chunking.
pub fn rechunk_store(
    input: &Path,
    output: &Path,
    chunks: &str,
    overwrite: bool,
    config: &RegridConfig,
) -> Result<ZarrWriteSummary> {
    let specs = parse_chunk_specs(chunks).context("Invalid --chunks")?;
    check_output(input, output, overwrite)?;

    let start = Instant::now();
    let summary = write_staged(output, |staging| {
        rechunk(input, staging, specs, config)
            .with_context(|| format!("Failed to rechunk {}", input.display()))
    })?;

    info!(
        output = %output.display(),
        arrays = summary.arrays,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Rechunked dataset"
    );
    Ok(summary)
}

fn writer(config: &RegridConfig, chunks: Option<&str>) -> Result<ZarrDatasetWriter> {
    let writer = ZarrDatasetWriter::new(config.clone());
    match chunks {
        Some(spec) => Ok(writer.with_chunks(parse_chunk_specs(spec).context("Invalid --chunks")?)),
        None => Ok(writer),
    }
}
