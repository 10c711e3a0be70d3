//! GeoJSON feature collections holding boundary datasets.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegionError, Result};
use crate::geometry::Geometry;

/// One boundary feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Always "Feature".
    #[serde(rename = "type")]
    pub feature_type: String,

    pub geometry: Geometry,

    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            feature_type: "Feature".to_string(),
            geometry,
            properties: serde_json::Map::new(),
        }
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// String property, if present.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    /// Integer property, accepting numbers stored as floats (`4.0`).
    pub fn property_u64(&self, key: &str) -> Option<u64> {
        let value = self.properties.get(key)?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        })
    }
}

/// A GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection".
    #[serde(rename = "type")]
    pub collection_type: String,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            collection_type: "FeatureCollection".to_string(),
            features,
        }
    }

    /// Read a collection from a GeoJSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| match e {
            RegionError::BoundaryData(msg) => {
                RegionError::BoundaryData(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        if collection.collection_type != "FeatureCollection" {
            return Err(RegionError::BoundaryData(format!(
                "expected FeatureCollection, got {}",
                collection.collection_type
            )));
        }
        Ok(collection)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
