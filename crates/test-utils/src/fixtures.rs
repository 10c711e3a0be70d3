//! Boundary fixtures for region resolution tests.
//!
//! Basis regions are approximated by rectangles. They are coarse but keep
//! the relative placement of the real boundaries, so a request such as
//! `EQAS` still covers Sumatra and Borneo.

use std::io;
use std::path::Path;

use fire_common::BoundingBox;
use regions::basis::BASIS_ID_PROPERTY;
use regions::countries::COUNTRY_NAME_PROPERTY;
use regions::resolver::{BASIS_FILE, COUNTRIES_FILE};
use regions::{
    BasisBoundaries, BasisRegion, CountryAliases, CountryBoundaries, Feature, FeatureCollection,
    Geometry, RegionResolver,
};

/// `(abbreviation, [min_lon, min_lat, max_lon, max_lat])` for all 14 basis regions.
pub const BASIS_BOXES: [(&str, [f64; 4]); 14] = [
    ("BONA", [-170.0, 50.0, -60.0, 75.0]),
    ("TENA", [-130.0, 25.0, -60.0, 50.0]),
    ("CEAM", [-118.0, 8.0, -60.0, 25.0]),
    ("NHSA", [-80.0, 0.0, -35.0, 8.0]),
    ("SHSA", [-80.0, -56.0, -35.0, 0.0]),
    ("EURO", [-10.0, 36.0, 60.0, 70.0]),
    ("MIDE", [35.0, 12.0, 60.0, 36.0]),
    ("NHAF", [-20.0, 0.0, 35.0, 36.0]),
    ("SHAF", [10.0, -35.0, 50.0, 0.0]),
    ("BOAS", [60.0, 50.0, 180.0, 75.0]),
    ("CEAS", [60.0, 30.0, 145.0, 50.0]),
    ("SEAS", [65.0, 10.0, 125.0, 30.0]),
    ("EQAS", [95.0, -10.0, 125.0, 10.0]),
    ("AUST", [110.0, -45.0, 180.0, -10.0]),
];

/// Country rectangles, keyed by dataset name.
pub const COUNTRY_BOXES: [(&str, [f64; 4]); 3] = [
    ("Bahamas, The", [-80.0, 20.0, -72.0, 27.0]),
    ("Indonesia", [95.0, -10.0, 141.0, 6.0]),
    ("Brazil", [-74.0, -34.0, -34.0, 5.0]),
];

fn box_geometry(b: [f64; 4]) -> Geometry {
    Geometry::from_bbox(&BoundingBox::new(b[0], b[1], b[2], b[3]))
}

fn basis_id(abbrev: &str) -> u8 {
    BasisRegion::by_abbrev(abbrev)
        .map(|r| r.id)
        .unwrap_or_else(|| panic!("unknown basis region {}", abbrev))
}

/// All 14 basis regions as rectangles.
pub fn fixture_basis() -> BasisBoundaries {
    let mut basis = BasisBoundaries::new();
    for (abbrev, b) in BASIS_BOXES {
        basis
            .insert(basis_id(abbrev), box_geometry(b))
            .expect("fixture boxes are valid");
    }
    basis
}

pub fn fixture_countries() -> CountryBoundaries {
    let mut countries = CountryBoundaries::new();
    for (name, b) in COUNTRY_BOXES {
        countries.insert(name, box_geometry(b));
    }
    countries
}

/// Resolver over the fixture boundaries and the built-in aliases.
pub fn fixture_resolver() -> RegionResolver {
    RegionResolver::new(fixture_basis(), fixture_countries(), CountryAliases::default())
}

/// Write the fixture boundaries as GeoJSON reference files into `dir`.
pub fn write_reference_dir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;

    let basis = FeatureCollection::new(
        BASIS_BOXES
            .iter()
            .map(|(abbrev, b)| Feature::new(box_geometry(*b)).with_property(BASIS_ID_PROPERTY, basis_id(abbrev)))
            .collect(),
    );
    let countries = FeatureCollection::new(
        COUNTRY_BOXES
            .iter()
            .map(|(name, b)| Feature::new(box_geometry(*b)).with_property(COUNTRY_NAME_PROPERTY, *name))
            .collect(),
    );

    for (file, collection) in [(BASIS_FILE, basis), (COUNTRIES_FILE, countries)] {
        let json = collection
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(dir.join(file), json)?;
    }
    Ok(())
}

/// Temporary reference directory holding the fixture boundaries.
pub fn temp_reference_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_reference_dir(dir.path()).expect("write reference files");
    dir
}
