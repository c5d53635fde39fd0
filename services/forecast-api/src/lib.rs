//! Forecast API service library.
//!
//! Serves bounding-box subsets of a gridded forecast Zarr store: a public
//! scalar mean and a bearer-protected GeoJSON point export.

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
