//! Region selection and resolution.
//!
//! A [`Region`] names what the user picked: a basis region, a country, a
//! point, a custom polygon or the whole globe. The [`RegionResolver`] turns
//! it into a [`Footprint`] in geographic coordinates using boundary
//! datasets loaded once at startup:
//!
//! - `basis_regions.geojson`: the 14 basis regions, keyed by a `basis` id
//! - `countries.geojson`: country polygons, keyed by `country_na`
//! - `country_aliases.yaml`: extra common-name aliases
//!
//! Country names are rewritten through [`CountryAliases`] before lookup.

pub mod basis;
pub mod countries;
pub mod error;
pub mod features;
pub mod geometry;
pub mod region;
pub mod resolver;

pub use basis::{BasisBoundaries, BasisRegion, BASIS_REGION_COUNT};
pub use countries::{CountryAliases, CountryBoundaries};
pub use error::{RegionError, Result};
pub use features::{Feature, FeatureCollection};
pub use geometry::{Geometry, Position};
pub use region::{point_name, sanitize_name, Region};
pub use resolver::{Footprint, RegionResolver};
