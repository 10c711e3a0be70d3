//! Attributes stored alongside each raster array.

use chrono::{DateTime, Utc};
use fire_common::{AffineTransform, CrsCode, GridDefinition};
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};

/// Zarr attributes describing one timestamped raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterMetadata {
    /// Band names in array order (first dimension).
    pub band_names: Vec<String>,
    /// Timestamp of the raster (month or day start).
    pub time: DateTime<Utc>,
    /// Coordinate reference system.
    pub crs: CrsCode,
    /// Affine transform in `crsTransform` order.
    pub transform: [f64; 6],
    /// Grid width (columns).
    pub width: usize,
    /// Grid height (rows).
    pub height: usize,
    /// Beyond the source's confirmed-final coverage.
    #[serde(default)]
    pub preliminary: bool,
    /// Producing dataset, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl RasterMetadata {
    /// Grid definition described by these attributes.
    pub fn grid(&self) -> GridDefinition {
        GridDefinition::new(
            self.crs,
            AffineTransform::from_terms(self.transform),
            self.width,
            self.height,
        )
    }

    /// Serialize into a Zarr attribute map.
    pub fn to_attributes(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(RasterError::invalid_metadata(format!(
                "expected attribute object, got {}",
                other
            ))),
        }
    }

    /// Parse from a Zarr attribute map.
    pub fn from_attributes(attrs: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(attrs.clone()))
            .map_err(|e| RasterError::invalid_metadata(e.to_string()))
    }
}
