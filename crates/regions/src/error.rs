//! Region resolution errors.

use fire_common::FireError;
use thiserror::Error;

/// Errors raised while parsing, loading or resolving regions.
#[derive(Debug, Error)]
pub enum RegionError {
    /// No boundary exists for the requested name (after alias remapping).
    #[error("region not found: {0}")]
    NotFound(String),

    /// Basis-region id or abbreviation outside the fixed table.
    #[error("unknown basis region: {0}")]
    UnknownBasisRegion(String),

    /// Ring or coordinate that cannot be used as a footprint.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Region selector string could not be parsed.
    #[error("invalid region selector: {0}")]
    Parse(String),

    /// Boundary or alias file is malformed.
    #[error("boundary data error: {0}")]
    BoundaryData(String),

    /// I/O failure reading reference data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegionError {
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

impl From<serde_json::Error> for RegionError {
    fn from(err: serde_json::Error) -> Self {
        RegionError::BoundaryData(format!("GeoJSON: {}", err))
    }
}

impl From<serde_yaml::Error> for RegionError {
    fn from(err: serde_yaml::Error) -> Self {
        RegionError::BoundaryData(format!("YAML: {}", err))
    }
}

impl From<RegionError> for FireError {
    fn from(err: RegionError) -> Self {
        match err {
            RegionError::NotFound(name) | RegionError::UnknownBasisRegion(name) => {
                FireError::RegionNotFound(name)
            }
            RegionError::InvalidGeometry(msg) => FireError::InvalidGeometry(msg),
            RegionError::Parse(msg) => FireError::InvalidParameter {
                param: "region".to_string(),
                message: msg,
            },
            RegionError::BoundaryData(msg) => FireError::DataRead(msg),
            RegionError::Io(e) => FireError::Storage(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegionError>;
