//! End-to-end requests against synthetic inventories.
//!
//! Every inventory stores uniform months: GFED on a 2.5 degree grid, the
//! others on the 5 degree comparison grid with 2 Tg per cell once unscaled.

use std::sync::Arc;

use emissions::inventory::NATIVE_BAND_SUFFIX;
use emissions::reduce::reduce;
use emissions::{
    EfModel, EfTable, EmissionsConfig, EmissionsPipeline, EmissionsRequest, GridSpec, Inventory,
    LandCoverClass, MemorySource, RegionMask, Weighting,
};
use fire_common::{Species, TimeResolution, YearRange};
use raster::{RasterConfig, RasterGrid};
use regions::Region;
use test_utils::{
    assert_approx_eq, assert_rel_eq, comparison_grid, fixture_resolver, gfed_grid, gfed_member,
    months_of, native_member, GfedMonth,
};

/// Stored value of every species band; 2 Tg per cell after the 1e9 divisor.
const STORED: f32 = 2e9;
/// 5 degree cells whose centres fall inside the EQAS fixture box.
const EQAS_CELLS: f64 = 24.0;

fn config() -> EmissionsConfig {
    let mut config = EmissionsConfig::default();
    config.comparison_grid = GridSpec::custom(&comparison_grid());
    for (inventory, settings) in config.inventories.iter_mut() {
        settings.grid = Some(if *inventory == Inventory::Gfed4s {
            GridSpec::custom(&gfed_grid())
        } else {
            GridSpec::custom(&comparison_grid())
        });
    }
    config
}

fn source(start: i32, end: i32) -> Arc<MemorySource> {
    let source = MemorySource::new();
    for (year, month) in months_of(start, end) {
        source
            .insert(Inventory::Gfed4s, gfed_member(&gfed_grid(), year, month, GfedMonth::default()))
            .unwrap();
        for inventory in &Inventory::ALL[1..] {
            let bands: Vec<String> = inventory
                .native_bands()
                .iter()
                .map(|b| format!("{}{}", b, NATIVE_BAND_SUFFIX))
                .collect();
            let bands: Vec<&str> = bands.iter().map(String::as_str).collect();
            source
                .insert(*inventory, native_member(&comparison_grid(), &bands, year, month, STORED))
                .unwrap();
        }
    }
    Arc::new(source)
}

fn pipeline_with(source: Arc<MemorySource>) -> EmissionsPipeline {
    EmissionsPipeline::new(config(), RasterConfig::default(), source, Arc::new(fixture_resolver()))
        .unwrap()
}

fn pipeline() -> EmissionsPipeline {
    pipeline_with(source(2010, 2012))
}

fn eqas() -> Region {
    Region::basis("EQAS").unwrap()
}

#[test]
fn test_co2_eqas_comparison() {
    let request = EmissionsRequest::new(Species::Co2, YearRange::new(2010, 2012).unwrap(), eqas());
    let tables = pipeline().compare(&request).unwrap();

    assert_eq!(tables.footprint.name, "EQAS");
    assert_eq!(
        tables.annual.columns,
        vec!["GFEDv4s", "FINNv1.5", "GFASv1.2", "QFEDv2.5r1", "FEERv1.0-G1.2"]
    );
    let labels: Vec<&str> = tables.annual.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["2010", "2011", "2012"]);
    assert_eq!(tables.monthly.len(), 36);

    for row in &tables.annual.rows {
        for value in &row.values {
            assert!(value.unwrap() >= 0.0);
        }
        assert!(!row.preliminary);
    }

    let finn = tables.annual.column("FINNv1.5").unwrap();
    assert_approx_eq!(finn[0].unwrap(), 2.0 * EQAS_CELLS * 12.0, 1e-3);
    let monthly = tables.monthly.column("QFEDv2.5r1").unwrap();
    assert_approx_eq!(monthly[0].unwrap(), 2.0 * EQAS_CELLS, 1e-4);
}

#[test]
fn test_gfed_total_is_conserved_across_grids() {
    let pipeline = pipeline();
    let years = YearRange::single(2010);
    let request = EmissionsRequest::new(Species::Co2, years, eqas())
        .with_inventories(vec![Inventory::Gfed4s]);
    let monthly = pipeline.monthly_table(&request).unwrap();
    let comparison = monthly.column("GFEDv4s").unwrap()[0].unwrap();

    let member = gfed_member(&gfed_grid(), 2010, 1, GfedMonth::default());
    let factors = EfTable::gfed4().factors(&Species::Co2).unwrap();
    let native = EfModel::default().emissions(&member.raster, &factors).unwrap();
    let footprint = pipeline.resolve(&eqas()).unwrap();
    let mask = RegionMask::build(&gfed_grid(), &footprint, Weighting::Unweighted, 1);
    let values = reduce(&native.select_band("Total").unwrap(), &mask, Default::default()).unwrap();
    let expected = values[0].1.unwrap();

    assert!(expected > 0.0);
    assert_rel_eq!(comparison, expected, 1e-4);
}

#[test]
fn test_annual_is_sum_of_months() {
    let pipeline = pipeline();
    let request = EmissionsRequest::new(Species::Co, YearRange::new(2010, 2011).unwrap(), eqas());
    let monthly = pipeline.by_month(&request).unwrap();
    let annual = pipeline.by_year(&request).unwrap();
    assert_eq!(annual.len(), 2);

    for inventory in Inventory::ALL {
        let months: f64 = monthly
            .iter()
            .filter(|m| m.year() == 2011)
            .map(|m| m.raster.band(inventory.id()).unwrap().total())
            .sum();
        let year = annual.get(1).unwrap().raster.band(inventory.id()).unwrap().total();
        assert_rel_eq!(year, months, 1e-5);
    }
}

#[test]
fn test_burned_area_global_monthly() {
    let pipeline = pipeline_with(source(2015, 2015));
    let request = EmissionsRequest::new(Species::BurnedArea, YearRange::single(2015), Region::Global);
    let table = pipeline.land_cover(&request, TimeResolution::Monthly).unwrap();

    assert_eq!(table.columns, vec!["BA", "BA_smallFires"]);
    assert_eq!(table.len(), 12);
    assert_eq!(table.rows[0].label, "2015-01");
    for row in &table.rows {
        let ba = row.values[0].unwrap();
        let small = row.values[1].unwrap();
        assert!(ba > 0.0);
        assert!(small <= ba);
        assert_rel_eq!(small, ba * 0.25, 1e-4);
    }
}

#[test]
fn test_burned_area_comparison_drops_species_inventories() {
    let request = EmissionsRequest::new(Species::BurnedArea, YearRange::single(2010), eqas());
    let table = pipeline().annual_table(&request).unwrap();
    assert_eq!(table.columns, vec!["GFEDv4s", "FINNv1.5"]);
    assert_eq!(table.len(), 1);
}

#[test]
fn test_years_outside_coverage_give_empty_tables() {
    let request = EmissionsRequest::new(Species::Co, YearRange::new(1900, 1901).unwrap(), eqas());
    let tables = pipeline().compare(&request).unwrap();
    assert!(tables.annual.is_empty());
    assert!(tables.monthly.is_empty());
    assert_eq!(
        tables.annual.to_csv_string().unwrap(),
        "Time,GFEDv4s,FINNv1.5,GFASv1.2,QFEDv2.5r1,FEERv1.0-G1.2\n"
    );
}

#[test]
fn test_closed_zero_area_polygon_gives_zeros() {
    let line = Region::Polygon {
        ring: vec![[100.0, 1.0], [110.0, 1.0], [100.0, 1.0]],
    };
    let request = EmissionsRequest::new(Species::Co, YearRange::single(2010), line);
    let table = pipeline().monthly_table(&request).unwrap();

    assert_eq!(table.len(), 12);
    for row in &table.rows {
        assert_eq!(row.values, vec![Some(0.0); Inventory::ALL.len()]);
    }
}

#[test]
fn test_unknown_region_fails_before_fetch() {
    let pipeline = pipeline();
    let request = EmissionsRequest::new(Species::Co, YearRange::single(2010), Region::country("Atlantis"));
    let err = pipeline.compare(&request).unwrap_err();
    assert_eq!(err.error_code(), "ErrRegionNotFound");
    assert_eq!(pipeline.cache_stats().misses, 0);
}

#[test]
fn test_unsupported_species() {
    let request = EmissionsRequest::new(Species::Other("XYZ".into()), YearRange::single(2010), eqas());
    let err = pipeline().compare(&request).unwrap_err();
    assert_eq!(err.error_code(), "ErrUnknownSpecies");
}

#[test]
fn test_repeat_request_hits_cache() {
    let pipeline = pipeline();
    let request = EmissionsRequest::new(Species::Ch4, YearRange::single(2011), eqas());
    let first = pipeline.compare(&request).unwrap();
    let misses = pipeline.cache_stats().misses;
    let second = pipeline.compare(&request).unwrap();

    assert_eq!(first.annual, second.annual);
    assert_eq!(pipeline.cache_stats().misses, misses);
    assert!(pipeline.cache_stats().hits >= 5);
}

#[test]
fn test_preliminary_years_are_flagged() {
    let pipeline = pipeline_with(source(2017, 2017));
    let request = EmissionsRequest::new(Species::Co, YearRange::single(2017), eqas());
    let table = pipeline.annual_table(&request).unwrap();
    // only GFED covers 2017
    assert_eq!(table.len(), 1);
    assert!(table.rows[0].preliminary);
    assert!(table.column("GFEDv4s").unwrap()[0].unwrap() > 0.0);
    assert_eq!(table.column("FINNv1.5").unwrap()[0], None);
}

#[test]
fn test_land_cover_breakdown_sums_to_total() {
    let request = EmissionsRequest::new(Species::Co, YearRange::single(2010), eqas());
    let table = pipeline().land_cover(&request, TimeResolution::Annual).unwrap();
    assert_eq!(
        table.columns,
        vec!["Total", "SAVA", "BORF", "TEMF", "DEFO", "PEAT", "AGRI"]
    );
    let row = &table.rows[0];
    let categories: f64 = row.values[1..].iter().map(|v| v.unwrap()).sum();
    assert_rel_eq!(row.values[0].unwrap(), categories, 1e-5);
}

#[test]
fn test_daily_sums_to_monthly() {
    let pipeline = pipeline();
    let daily = pipeline.daily(&Species::Co, 2010, &eqas()).unwrap();
    assert_eq!(daily.len(), 365);
    assert_eq!(daily.columns, vec!["CO"]);
    assert_eq!(daily.rows[31].label, "2010-02-01");

    let request = EmissionsRequest::new(Species::Co, YearRange::single(2010), eqas())
        .with_inventories(vec![Inventory::Gfed4s]);
    let land_cover = pipeline.land_cover(&request, TimeResolution::Annual).unwrap();
    let annual = land_cover.column("Total").unwrap()[0].unwrap();
    let days: f64 = daily.column("CO").unwrap().iter().map(|v| v.unwrap()).sum();
    assert_rel_eq!(days, annual, 1e-4);
}

#[test]
fn test_daily_before_fractions_is_invalid_range() {
    let err = pipeline().daily(&Species::Co, 2002, &eqas()).unwrap_err();
    assert_eq!(err.error_code(), "ErrInvalidRange");
}

#[test]
fn test_ef_table_comparison() {
    let request = EmissionsRequest::new(Species::Co, YearRange::single(2010), eqas());
    let table = pipeline().ef_compare(&request, TimeResolution::Annual).unwrap();
    assert_eq!(table.columns, vec!["Old", "New"]);
    assert_eq!(table.len(), 1);
    let old = table.rows[0].values[0].unwrap();
    let new = table.rows[0].values[1].unwrap();
    assert!(old > 0.0 && new > 0.0);
    assert!((old - new).abs() > 1e-9);
}

#[test]
fn test_land_cover_composition() {
    let source = source(2010, 2012);
    let igbp = RasterGrid::filled(comparison_grid(), &["LC_Type1"], 2.0);
    source.insert_land_cover(2011, igbp).unwrap();
    let pipeline = pipeline_with(source);

    let composition = pipeline
        .land_cover_composition(&YearRange::new(2010, 2012).unwrap(), &eqas())
        .unwrap()
        .unwrap();
    assert_eq!(composition.year, 2011);
    let tropical = composition
        .fractions
        .iter()
        .find(|(c, _)| *c == LandCoverClass::Tropical)
        .unwrap()
        .1;
    assert_approx_eq!(tropical, 1.0, 1e-9);

    // clamped to 2018, which the source does not have
    let later = pipeline
        .land_cover_composition(&YearRange::new(2030, 2031).unwrap(), &eqas())
        .unwrap();
    assert!(later.is_none());
}
