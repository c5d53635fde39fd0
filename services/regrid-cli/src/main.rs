//! Regrid command line tool.
//!
//! Regrids Zarr stores between regular lat-lon and reduced Gaussian grids
//! and rewrites stores with new chunking.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use regrid::{
    GaussianRegridder, GaussianToLatLonRegridder, LatLonRegridder, RegridConfig,
    ZarrWriteSummary,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use regrid_cli::{rechunk_store, regrid_store};

#[derive(Parser, Debug)]
#[command(name = "regrid")]
#[command(about = "Regrid forecast datasets between regular and reduced Gaussian grids")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory holding cached interpolation weights
    #[arg(long, global = true, env = "REGRID_WEIGHTS_DIR")]
    weights_dir: Option<PathBuf>,

    /// Directory holding reduced Gaussian grid descriptions
    #[arg(long, global = true, env = "REGRID_GRID_INFO_DIR")]
    grid_info_dir: Option<PathBuf>,

    /// Default chunk edge for written arrays
    #[arg(long, global = true, env = "REGRID_CHUNK_SIZE")]
    chunk_size: Option<usize>,

    /// Log level
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

/// Input and output stores shared by every subcommand.
#[derive(ClapArgs, Debug)]
struct Stores {
    /// Input Zarr store
    input: PathBuf,

    /// Output Zarr store
    output: PathBuf,

    /// Per-dimension chunking, e.g. `init=1,point=-1`
    #[arg(long)]
    chunks: Option<String>,

    /// Replace the output store if it exists
    #[arg(long)]
    overwrite: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Regular lat-lon to a reduced Gaussian grid (flat `point` output)
    Gaussian {
        #[command(flatten)]
        stores: Stores,

        /// Grid name, e.g. `O320`; read from `<grid-info-dir>/<name>.json`
        #[arg(long)]
        grid: String,
    },

    /// Regular lat-lon to another regular resolution
    Latlon {
        #[command(flatten)]
        stores: Stores,

        /// Target resolution in degrees; omitted copies the input unchanged
        #[arg(long)]
        resolution: Option<f64>,
    },

    /// Reduced Gaussian points to a regular lat-lon grid
    ToLatlon {
        #[command(flatten)]
        stores: Stores,

        /// Target resolution in degrees
        #[arg(long)]
        resolution: f64,

        /// Explicit weights file, overriding the weights directory
        #[arg(long)]
        weights: Option<PathBuf>,
    },

    /// Rewrite a store with new chunking
    Rechunk {
        /// Input Zarr store
        input: PathBuf,

        /// Output Zarr store
        output: PathBuf,

        /// Per-dimension chunking, e.g. `init=1,point=-1`
        #[arg(long)]
        chunks: String,

        /// Replace the output store if it exists
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let config = load_config(&args)?;
    info!(
        weights_dir = %config.weights_dir.display(),
        grid_info_dir = %config.grid_info_dir.display(),
        chunk_size = config.chunk_size,
        "Loaded configuration"
    );

    let summary = run(args.command, &config)?;
    info!(
        arrays = summary.arrays,
        bytes = summary.bytes_written,
        "Done"
    );
    Ok(())
}

fn load_config(args: &Args) -> Result<RegridConfig> {
    let mut config = RegridConfig::from_env();
    if let Some(dir) = &args.weights_dir {
        config.weights_dir = dir.clone();
    }
    if let Some(dir) = &args.grid_info_dir {
        config.grid_info_dir = dir.clone();
    }
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn run(command: Command, config: &RegridConfig) -> Result<ZarrWriteSummary> {
    match command {
        Command::Gaussian { stores, grid } => {
            let regridder = GaussianRegridder::from_config(&grid, config)
                .with_context(|| format!("Failed to load grid {}", grid))?;
            regrid_store(
                &regridder,
                &stores.input,
                &stores.output,
                stores.chunks.as_deref(),
                stores.overwrite,
                config,
            )
        }
        Command::Latlon { stores, resolution } => {
            let regridder = LatLonRegridder::new(resolution)
                .with_config(config.clone())
                .with_weights_dir(&config.weights_dir);
            regrid_store(
                &regridder,
                &stores.input,
                &stores.output,
                stores.chunks.as_deref(),
                stores.overwrite,
                config,
            )
        }
        Command::ToLatlon {
            stores,
            resolution,
            weights,
        } => {
            let mut regridder = GaussianToLatLonRegridder::new(resolution)
                .with_config(config.clone())
                .with_weights_dir(&config.weights_dir);
            if let Some(path) = weights {
                regridder = regridder.with_weights_path(path);
            }
            regrid_store(
                &regridder,
                &stores.input,
                &stores.output,
                stores.chunks.as_deref(),
                stores.overwrite,
                config,
            )
        }
        Command::Rechunk {
            input,
            output,
            chunks,
            overwrite,
        } => rechunk_store(&input, &output, &chunks, overwrite, config),
    }
}
