//! Resolution of [`Region`] selections into footprints.

use std::path::Path;

use fire_common::BoundingBox;
use tracing::{debug, info};

use crate::basis::{BasisBoundaries, BasisRegion};
use crate::countries::{CountryAliases, CountryBoundaries};
use crate::error::{RegionError, Result};
use crate::geometry::Geometry;
use crate::region::{point_name, sanitize_name, Region};

/// Basis boundary file inside a reference directory.
pub const BASIS_FILE: &str = "basis_regions.geojson";
/// Country boundary file inside a reference directory.
pub const COUNTRIES_FILE: &str = "countries.geojson";
/// Optional alias overrides inside a reference directory.
pub const ALIASES_FILE: &str = "country_aliases.yaml";

/// A resolved region: geographic geometry plus the name used in exports.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub region: Region,
    /// Export-safe name (`EQAS`, `Bahamas,_The`, `111.3E_2.8S`, `Global`).
    pub name: String,
    /// Geometry in EPSG:4326.
    pub geometry: Geometry,
}

impl Footprint {
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.geometry.bbox()
    }

    /// Whether reduction should use the single cell enclosing the point.
    pub fn is_point(&self) -> bool {
        self.geometry.is_point()
    }
}

/// Resolves regions against the basis and country boundary datasets.
///
/// Boundary and alias tables are loaded once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct RegionResolver {
    basis: BasisBoundaries,
    countries: CountryBoundaries,
    aliases: CountryAliases,
}

impl RegionResolver {
    pub fn new(basis: BasisBoundaries, countries: CountryBoundaries, aliases: CountryAliases) -> Self {
        Self {
            basis,
            countries,
            aliases,
        }
    }

    /// Load reference data from a directory.
    ///
    /// `basis_regions.geojson` is required. A missing `countries.geojson`
    /// leaves the country table empty and a missing `country_aliases.yaml`
    /// keeps the built-in aliases.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let basis = BasisBoundaries::from_path(dir.join(BASIS_FILE))?;

        let countries_path = dir.join(COUNTRIES_FILE);
        let countries = if countries_path.exists() {
            CountryBoundaries::from_path(&countries_path)?
        } else {
            debug!(path = %countries_path.display(), "No country boundaries");
            CountryBoundaries::new()
        };

        let aliases_path = dir.join(ALIASES_FILE);
        let aliases = if aliases_path.exists() {
            CountryAliases::from_path(&aliases_path)?
        } else {
            CountryAliases::default()
        };

        info!(
            basis = basis.len(),
            countries = countries.len(),
            aliases = aliases.len(),
            "Loaded region reference data"
        );
        Ok(Self::new(basis, countries, aliases))
    }

    pub fn basis(&self) -> &BasisBoundaries {
        &self.basis
    }

    pub fn countries(&self) -> &CountryBoundaries {
        &self.countries
    }

    pub fn aliases(&self) -> &CountryAliases {
        &self.aliases
    }

    /// Resolve a region into its footprint.
    ///
    /// Country names pass through the alias table before lookup. Custom
    /// polygons are validated as simple rings. `Global` is the rectangle
    /// spanning all basis regions.
    pub fn resolve(&self, region: &Region) -> Result<Footprint> {
        let (name, geometry) = match region {
            Region::Basis { id } => {
                let basis = BasisRegion::by_id(*id)
                    .ok_or_else(|| RegionError::UnknownBasisRegion(id.to_string()))?;
                let geometry = self
                    .basis
                    .get(*id)
                    .cloned()
                    .ok_or_else(|| RegionError::NotFound(basis.label()))?;
                (basis.abbrev.to_string(), geometry)
            }
            Region::Country { name } => {
                let canonical = self.aliases.canonical(name);
                let geometry = self
                    .countries
                    .get(canonical)
                    .cloned()
                    .ok_or_else(|| RegionError::NotFound(canonical.to_string()))?;
                (sanitize_name(canonical), geometry)
            }
            Region::Point { lon, lat } => (point_name(*lon, *lat), Geometry::point(*lon, *lat)?),
            Region::Polygon { ring } => ("Custom".to_string(), Geometry::polygon(ring.clone())?),
            Region::Global => {
                let bbox = self.basis.union_bbox().ok_or_else(|| {
                    RegionError::NotFound("Global (no basis regions loaded)".to_string())
                })?;
                ("Global".to_string(), Geometry::from_bbox(&bbox))
            }
        };

        debug!(region = %region, name = %name, "Resolved region");
        Ok(Footprint {
            region: region.clone(),
            name,
            geometry,
        })
    }
}
