//! Error types for raster processing.

use fire_common::FireError;
use thiserror::Error;

/// Errors that can occur while building, combining or storing rasters.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Grids with different definitions or band sets were combined.
    #[error("grid mismatch: {0}")]
    GridMismatch(String),

    /// A transform with zero cell size cannot be resampled.
    #[error("degenerate transform: {0}")]
    DegenerateTransform(String),

    /// The requested band does not exist.
    #[error("band not found: {0}")]
    BandNotFound(String),

    /// Projection error.
    #[error("projection error: {0}")]
    ProjectionError(String),

    /// Invalid metadata in a stored raster.
    #[error("invalid raster metadata: {0}")]
    InvalidMetadata(String),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    ZarrError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl RasterError {
    /// Create a GridMismatch error.
    pub fn grid_mismatch(msg: impl Into<String>) -> Self {
        Self::GridMismatch(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create a ZarrError.
    pub fn zarr_error(msg: impl Into<String>) -> Self {
        Self::ZarrError(msg.into())
    }

    /// Create a StorageError.
    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

impl From<FireError> for RasterError {
    fn from(err: FireError) -> Self {
        match err {
            FireError::GridMismatch(msg) => Self::GridMismatch(msg),
            FireError::DegenerateTransform(msg) => Self::DegenerateTransform(msg),
            FireError::Projection(msg) => Self::ProjectionError(msg),
            other => Self::InvalidMetadata(other.to_string()),
        }
    }
}

impl From<RasterError> for FireError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::GridMismatch(msg) => FireError::GridMismatch(msg),
            RasterError::DegenerateTransform(msg) => FireError::DegenerateTransform(msg),
            RasterError::BandNotFound(band) => {
                FireError::GridMismatch(format!("band not found: {}", band))
            }
            RasterError::ProjectionError(msg) => FireError::Projection(msg),
            RasterError::ConfigError(msg) => FireError::Config(msg),
            RasterError::InvalidMetadata(msg) | RasterError::ZarrError(msg) => {
                FireError::DataRead(msg)
            }
            RasterError::StorageError(msg) => FireError::Storage(msg),
        }
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
