//! Regrid command line library.
//!
//! Each subcommand of the `regrid` binary reads a Zarr store, transforms it
//! and writes a new store. Stores are written beside the output and moved
//! into place once complete.

pub mod commands;

pub use commands::{check_output, rechunk_store, regrid_store, staging_path};
