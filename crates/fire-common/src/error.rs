//! Error types for the fire-emissions pipeline.

use thiserror::Error;

/// Result type alias using FireError.
pub type FireResult<T> = Result<T, FireError>;

/// Primary error type for emissions requests.
#[derive(Debug, Error)]
pub enum FireError {
    // === Request Errors ===
    #[error("Invalid year range {start}-{end}: {reason}")]
    InvalidRange { start: i32, end: i32, reason: String },

    #[error("Region not found: {0}")]
    RegionNotFound(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    #[error("Species '{species}' is not provided by {inventory}")]
    UnsupportedSpecies { species: String, inventory: String },

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Grid Errors ===
    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    #[error("Degenerate affine transform: {0}")]
    DegenerateTransform(String),

    #[error("Projection error: {0}")]
    Projection(String),

    // === Data Errors ===
    #[error("Failed to read data: {0}")]
    DataRead(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FireError {
    /// Create an invalid-range error.
    pub fn invalid_range(start: i32, end: i32, reason: impl Into<String>) -> Self {
        FireError::InvalidRange {
            start,
            end,
            reason: reason.into(),
        }
    }

    /// Short machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            FireError::InvalidRange { .. } => "ErrInvalidRange",
            FireError::RegionNotFound(_) => "ErrRegionNotFound",
            FireError::InvalidGeometry(_) => "ErrInvalidGeometry",
            FireError::UnknownSpecies(_) | FireError::UnsupportedSpecies { .. } => {
                "ErrUnknownSpecies"
            }
            FireError::InvalidParameter { .. } => "ErrInvalidParameter",
            FireError::GridMismatch(_) => "GridMismatchError",
            FireError::DegenerateTransform(_) | FireError::Projection(_) => "ErrProjection",
            FireError::DataRead(_) | FireError::Storage(_) => "ErrDataAccess",
            FireError::Config(_) => "ErrConfig",
            FireError::Internal(_) => "ErrInternal",
        }
    }

    /// Whether the error was caused by the request rather than the system.
    ///
    /// Caller errors are deterministic and never worth retrying.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            FireError::InvalidRange { .. }
                | FireError::RegionNotFound(_)
                | FireError::InvalidGeometry(_)
                | FireError::UnknownSpecies(_)
                | FireError::UnsupportedSpecies { .. }
                | FireError::InvalidParameter { .. }
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for FireError {
    fn from(err: std::io::Error) -> Self {
        FireError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for FireError {
    fn from(err: serde_json::Error) -> Self {
        FireError::DataRead(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors() {
        assert!(FireError::invalid_range(2012, 2010, "start after end").is_caller_error());
        assert!(FireError::RegionNotFound("Atlantis".into()).is_caller_error());
        assert!(!FireError::GridMismatch("bands".into()).is_caller_error());
        assert!(!FireError::Storage("disk".into()).is_caller_error());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            FireError::invalid_range(1, 0, "x").error_code(),
            "ErrInvalidRange"
        );
        assert_eq!(
            FireError::GridMismatch("x".into()).error_code(),
            "GridMismatchError"
        );
    }

    #[test]
    fn test_display() {
        let err = FireError::invalid_range(2012, 2010, "start year after end year");
        assert_eq!(
            err.to_string(),
            "Invalid year range 2012-2010: start year after end year"
        );
    }
}
