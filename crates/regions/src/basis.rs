//! The fourteen GFED basis regions.
//!
//! Region ids (0-13) come from the boundary dataset and do not follow the
//! order in which regions are listed to users. [`BASIS_CODES`] maps each id
//! to its position in the display list.

use std::collections::BTreeMap;
use std::path::Path;

use fire_common::BoundingBox;
use tracing::{debug, warn};

use crate::error::{RegionError, Result};
use crate::features::FeatureCollection;
use crate::geometry::Geometry;

/// Number of basis regions.
pub const BASIS_REGION_COUNT: usize = 14;

/// Abbreviation and name, in display order.
const DISPLAY_ORDER: [(&str, &str); BASIS_REGION_COUNT] = [
    ("BONA", "Boreal North America"),
    ("TENA", "Temperate North America"),
    ("CEAM", "Central America"),
    ("NHSA", "Northern Hemisphere South America"),
    ("SHSA", "Southern Hemisphere South America"),
    ("EURO", "Europe"),
    ("MIDE", "Middle East"),
    ("NHAF", "Northern Hemisphere Africa"),
    ("SHAF", "Southern Hemisphere Africa"),
    ("BOAS", "Boreal Asia"),
    ("CEAS", "Central Asia"),
    ("SEAS", "Southeast Asia"),
    ("EQAS", "Equatorial Asia"),
    ("AUST", "Australia and New Zealand"),
];

/// Display position of each region id.
pub const BASIS_CODES: [usize; BASIS_REGION_COUNT] = [2, 13, 3, 9, 12, 6, 7, 8, 11, 1, 4, 10, 5, 0];

/// Feature property carrying the region id in boundary files.
pub const BASIS_ID_PROPERTY: &str = "basis";

/// One entry of the basis-region table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasisRegion {
    pub id: u8,
    pub abbrev: &'static str,
    pub name: &'static str,
}

impl BasisRegion {
    /// Look up a region by id.
    pub fn by_id(id: u8) -> Option<Self> {
        let display = *BASIS_CODES.get(id as usize)?;
        let (abbrev, name) = DISPLAY_ORDER[display];
        Some(Self { id, abbrev, name })
    }

    /// Look up a region by abbreviation or `"ABBR - Name"` label (case-insensitive).
    pub fn by_abbrev(label: &str) -> Option<Self> {
        let abbrev = label.split(" - ").next().unwrap_or(label).trim();
        Self::all().find(|r| r.abbrev.eq_ignore_ascii_case(abbrev))
    }

    /// Resolve an id, abbreviation or display label.
    pub fn lookup(key: &str) -> Result<Self> {
        let key = key.trim();
        let found = match key.parse::<u8>() {
            Ok(id) => Self::by_id(id),
            Err(_) => Self::by_abbrev(key),
        };
        found.ok_or_else(|| RegionError::UnknownBasisRegion(key.to_string()))
    }

    /// All regions ordered by id.
    pub fn all() -> impl Iterator<Item = BasisRegion> {
        (0..BASIS_REGION_COUNT as u8).filter_map(Self::by_id)
    }

    /// All regions in the order they are listed to users.
    pub fn in_display_order() -> impl Iterator<Item = BasisRegion> {
        (0..BASIS_REGION_COUNT).filter_map(|display| {
            BASIS_CODES
                .iter()
                .position(|&d| d == display)
                .and_then(|id| Self::by_id(id as u8))
        })
    }

    /// `"EQAS - Equatorial Asia"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.abbrev, self.name)
    }
}

/// Boundaries of the basis regions, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct BasisBoundaries {
    regions: BTreeMap<u8, Geometry>,
}

impl BasisBoundaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one region's boundary.
    pub fn insert(&mut self, id: u8, geometry: Geometry) -> Result<()> {
        if BasisRegion::by_id(id).is_none() {
            return Err(RegionError::UnknownBasisRegion(id.to_string()));
        }
        geometry.validate()?;
        match self.regions.remove(&id) {
            Some(existing) => self.regions.insert(id, existing.merge(geometry)),
            None => self.regions.insert(id, geometry),
        };
        Ok(())
    }

    /// Build from features carrying a `basis` id property.
    ///
    /// Several features with the same id are merged into one multi-polygon.
    pub fn from_collection(collection: FeatureCollection) -> Result<Self> {
        let mut boundaries = Self::new();
        for (i, feature) in collection.features.into_iter().enumerate() {
            let id = feature
                .property_u64(BASIS_ID_PROPERTY)
                .and_then(|id| u8::try_from(id).ok())
                .ok_or_else(|| {
                    RegionError::BoundaryData(format!(
                        "feature {} has no valid '{}' property",
                        i, BASIS_ID_PROPERTY
                    ))
                })?;
            boundaries.insert(id, feature.geometry)?;
        }

        let missing: Vec<&str> = BasisRegion::all()
            .filter(|r| !boundaries.regions.contains_key(&r.id))
            .map(|r| r.abbrev)
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Basis boundary set is incomplete");
        }
        debug!(regions = boundaries.len(), "Loaded basis boundaries");
        Ok(boundaries)
    }

    /// Load from a GeoJSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_collection(FeatureCollection::from_path(path)?)
    }

    pub fn get(&self, id: u8) -> Option<&Geometry> {
        self.regions.get(&id)
    }

    /// Union of the bounding boxes of every loaded region.
    pub fn union_bbox(&self) -> Option<BoundingBox> {
        self.regions
            .values()
            .filter_map(Geometry::bbox)
            .reduce(|a, b| a.union(&b))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
