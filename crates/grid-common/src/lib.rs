//! Common types and utilities shared across the forecast regrid workspace.

pub mod bbox;
pub mod grid;
pub mod time;

pub use bbox::{BboxError, BoundingBox};
pub use grid::{arange, is_close, linspace_exclusive, normalize_longitude};
pub use time::{CfTimeUnits, TimeParseError, TimeUnit};
