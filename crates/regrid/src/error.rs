//! Error types for regridding.

use thiserror::Error;

/// Errors that can occur while building grids, computing weights or
/// moving datasets in and out of Zarr stores.
#[derive(Error, Debug)]
pub enum RegridError {
    /// A grid has a zero-size dimension or no usable points.
    #[error("degenerate grid: {0}")]
    DegenerateGrid(String),

    /// Grid coordinates are inconsistent or unusable.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// The reduced grid description could not be read or is malformed.
    #[error("invalid grid info: {0}")]
    GridInfo(String),

    /// Array shapes do not agree with each other.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A required data variable is missing from the dataset.
    #[error("variable not found: {0}")]
    MissingVariable(String),

    /// A required coordinate is missing from the dataset.
    #[error("coordinate not found: {0}")]
    MissingCoordinate(String),

    /// A weights artifact could not be used.
    #[error("weights error: {0}")]
    Weights(String),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    ZarrError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Invalid metadata in a store.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl RegridError {
    /// Create a DegenerateGrid error.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGrid(msg.into())
    }

    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create a Weights error.
    pub fn weights(msg: impl Into<String>) -> Self {
        Self::Weights(msg.into())
    }

    /// Create a ZarrError.
    pub fn zarr_error(msg: impl Into<String>) -> Self {
        Self::ZarrError(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }
}

impl From<std::io::Error> for RegridError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for RegridError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

impl From<ndarray::ShapeError> for RegridError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::ShapeMismatch(err.to_string())
    }
}

/// Result type for regrid operations.
pub type Result<T> = std::result::Result<T, RegridError>;
