//! Configuration for the raster engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How cell values are carried onto a new grid definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    /// Value of the source cell containing the target cell centre.
    Nearest,
    /// Bilinear blend of the four surrounding source cell centres.
    Bilinear,
    /// Mass-conserving redistribution for sum-type fields (emissions, area).
    #[default]
    AreaWeighted,
    /// Overlap-weighted average for intensive fields (fractions, densities).
    Mean,
}

impl ResampleMethod {
    /// Parse from string (case-insensitive), falling back to the default.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "nearest" => Self::Nearest,
            "bilinear" => Self::Bilinear,
            "area_weighted" | "conservative" | "sum" => Self::AreaWeighted,
            "mean" | "average" => Self::Mean,
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::AreaWeighted => "area_weighted",
            Self::Mean => "mean",
        }
    }

    /// True for methods that preserve the total of a sum-type field.
    pub fn conserves_mass(&self) -> bool {
        matches!(self, Self::AreaWeighted)
    }
}

impl fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compression codec for Zarr files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZarrCompression {
    /// No compression.
    None,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd.
    #[default]
    BloscZstd,
}

impl ZarrCompression {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "lz4" | "blosc_lz4" => Self::BloscLz4,
            _ => Self::BloscZstd,
        }
    }

    /// Get the codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl fmt::Display for ZarrCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for resampling and raster persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Resampling method used when adapters move data onto an analysis grid.
    pub resample_method: ResampleMethod,

    /// Sub-cell samples per axis for cross-CRS conservative resampling.
    pub supersample: usize,

    /// Chunk dimension for Zarr files (square chunks per band).
    pub zarr_chunk_size: usize,

    /// Compression codec for Zarr files.
    pub zarr_compression: ZarrCompression,

    /// Compression level (1-9).
    pub zarr_compression_level: u8,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            resample_method: ResampleMethod::AreaWeighted,
            supersample: 4,
            zarr_chunk_size: 360,
            zarr_compression: ZarrCompression::BloscZstd,
            zarr_compression_level: 5,
        }
    }
}

impl RasterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("FIRECAM_RESAMPLE_METHOD") {
            config.resample_method = ResampleMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("FIRECAM_SUPERSAMPLE") {
            if let Ok(factor) = val.parse() {
                config.supersample = factor;
            }
        }

        if let Ok(val) = std::env::var("FIRECAM_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                config.zarr_chunk_size = size;
            }
        }

        if let Ok(val) = std::env::var("FIRECAM_ZARR_COMPRESSION") {
            config.zarr_compression = ZarrCompression::from_str(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.supersample == 0 || self.supersample > 32 {
            return Err("supersample must be 1-32".to_string());
        }

        if self.zarr_chunk_size == 0 {
            return Err("zarr_chunk_size must be > 0".to_string());
        }

        if self.zarr_compression_level == 0 || self.zarr_compression_level > 9 {
            return Err("zarr_compression_level must be 1-9".to_string());
        }

        Ok(())
    }
}
