//! Loading reference data from disk and resolving regions against it.

use regions::{
    BasisRegion, Feature, FeatureCollection, Geometry, Region, RegionError, RegionResolver,
    BASIS_REGION_COUNT,
};

fn square(x: f64, y: f64, size: f64) -> Geometry {
    Geometry::polygon(vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size]])
        .expect("valid square")
}

/// Every basis region as a 10° square on a row of tiles.
fn write_reference_dir(dir: &std::path::Path, with_countries: bool) {
    let features = BasisRegion::all()
        .map(|r| {
            let x = -170.0 + 20.0 * r.id as f64;
            Feature::new(square(x, -40.0 + r.id as f64, 10.0)).with_property("basis", r.id)
        })
        .collect();
    let basis = FeatureCollection::new(features);
    std::fs::write(
        dir.join("basis_regions.geojson"),
        basis.to_json().expect("serialize basis"),
    )
    .expect("write basis");

    if with_countries {
        let countries = FeatureCollection::new(vec![
            Feature::new(square(-79.0, 23.0, 2.0)).with_property("country_na", "Bahamas, The"),
            Feature::new(square(-78.0, 21.0, 1.0)).with_property("country_na", "Bahamas, The"),
            Feature::new(square(-4.0, 40.0, 5.0)).with_property("country_na", "Cote d'Ivoire"),
        ]);
        std::fs::write(
            dir.join("countries.geojson"),
            countries.to_json().expect("serialize countries"),
        )
        .expect("write countries");
        std::fs::write(
            dir.join("country_aliases.yaml"),
            "Ivory Coast: \"Cote d'Ivoire\"\n",
        )
        .expect("write aliases");
    }
}

#[test]
fn test_load_reference_dir() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_reference_dir(dir.path(), true);

    let resolver = RegionResolver::from_dir(dir.path()).expect("load");
    assert_eq!(resolver.basis().len(), BASIS_REGION_COUNT);
    assert_eq!(resolver.countries().len(), 2);
    // built-in aliases plus the file entry
    assert_eq!(resolver.aliases().len(), 11);

    let fp = resolver
        .resolve(&Region::country("Ivory Coast"))
        .expect("alias from file");
    assert_eq!(fp.name, "Cote_dIvoire");
}

#[test]
fn test_country_resolution_is_deterministic() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_reference_dir(dir.path(), true);
    let resolver = RegionResolver::from_dir(dir.path()).expect("load");

    let first = resolver.resolve(&Region::country("Bahamas")).expect("first");
    let second = resolver.resolve(&Region::country("Bahamas")).expect("second");
    assert_eq!(resolver.aliases().canonical("Bahamas"), "Bahamas, The");
    assert_eq!(first, second);
    // both islands merged into one footprint
    assert_eq!(first.geometry.polygons().len(), 2);
    assert!(first.geometry.contains(-77.5, 21.5));
}

#[test]
fn test_missing_optional_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_reference_dir(dir.path(), false);
    let resolver = RegionResolver::from_dir(dir.path()).expect("load");

    assert!(resolver.countries().is_empty());
    assert_eq!(resolver.aliases().len(), 10);
    let err = resolver
        .resolve(&Region::country("Bahamas"))
        .expect_err("no countries loaded");
    assert!(matches!(err, RegionError::NotFound(ref name) if name == "Bahamas, The"));

    let fire: fire_common::FireError = err.into();
    assert_eq!(fire.error_code(), "ErrRegionNotFound");
}

#[test]
fn test_missing_basis_file_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(matches!(
        RegionResolver::from_dir(dir.path()),
        Err(RegionError::Io(_))
    ));
}

#[test]
fn test_global_spans_all_tiles() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_reference_dir(dir.path(), false);
    let resolver = RegionResolver::from_dir(dir.path()).expect("load");

    let bbox = resolver
        .resolve(&Region::Global)
        .expect("global")
        .bbox()
        .expect("bbox");
    assert_eq!(bbox.min_x, -170.0);
    assert_eq!(bbox.max_x, -170.0 + 20.0 * 13.0 + 10.0);
    assert_eq!(bbox.min_y, -40.0);
    assert_eq!(bbox.max_y, -40.0 + 13.0 + 10.0);
}
