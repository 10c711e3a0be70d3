//! Integration test: write monthly rasters to a Zarr collection and read them back.

use fire_common::grid::grids;
use fire_common::time::month_start;
use fire_common::{AffineTransform, CrsCode, GridDefinition};
use raster::{
    read_raster, Band, RasterConfig, RasterGrid, RasterTimeSeries, TimestampedRaster,
    ZarrCollection, ZarrCompression, ZarrRasterWriter,
};
use zarrs_filesystem::FilesystemStore;

/// Value at (col, row) = col * 1000 + row + offset (for easy verification)
fn create_test_data(width: usize, height: usize, offset: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32 + offset);
        }
    }
    data
}

fn small_grid() -> GridDefinition {
    GridDefinition::new(
        CrsCode::Epsg4326,
        AffineTransform::north_up(100.0, 10.0, 0.5, 0.5),
        40,
        20,
    )
}

fn member(year: i32, month: u32) -> TimestampedRaster {
    let grid = small_grid();
    let raster = RasterGrid::new(
        grid,
        vec![
            Band::new("CO_0-5deg", create_test_data(grid.width, grid.height, month as f32)),
            Band::new("BC_0-5deg", vec![1.5e9; grid.len()]),
        ],
    )
    .expect("Failed to build raster");
    TimestampedRaster::new(month_start(year, month).expect("valid month"), raster)
}

#[test]
fn test_single_raster_roundtrip() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("single.zarr");
    std::fs::create_dir_all(&path).expect("Failed to create array dir");

    let original = member(2016, 7).with_preliminary(true);
    let config = RasterConfig {
        zarr_chunk_size: 16,
        ..Default::default()
    };
    let writer = ZarrRasterWriter::new(config);
    let store = FilesystemStore::new(&path).expect("Failed to open store");
    let bytes = writer
        .write(store, "/", &original, Some("FINNv1p5"))
        .expect("Failed to write raster");
    assert_eq!(bytes, (2 * 40 * 20 * 4) as u64);

    let store = FilesystemStore::new(&path).expect("Failed to reopen store");
    let (restored, source) = read_raster(store, "/").expect("Failed to read raster");

    assert_eq!(source.as_deref(), Some("FINNv1p5"));
    assert_eq!(restored.time, original.time);
    assert!(restored.preliminary);
    assert!(restored.raster.grid().matches(original.raster.grid()));
    assert_eq!(restored.raster.band_names(), vec!["CO_0-5deg", "BC_0-5deg"]);
    assert_eq!(restored.raster.get("CO_0-5deg", 12, 7), Some(12007.0 + 7.0));
    assert_eq!(restored.raster, original.raster);
}

#[test]
fn test_uncompressed_global_grid() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("global.zarr");
    std::fs::create_dir_all(&path).expect("Failed to create array dir");

    let grid = grids::geographic_0p5();
    let raster = RasterGrid::single_band(grid, "DM", vec![0.25; grid.len()]).expect("raster");
    let original = TimestampedRaster::new(month_start(2005, 1).expect("month"), raster);

    let writer = ZarrRasterWriter::new(RasterConfig {
        zarr_compression: ZarrCompression::None,
        ..Default::default()
    });
    let store = FilesystemStore::new(&path).expect("store");
    writer.write(store, "/", &original, None).expect("write");

    let store = FilesystemStore::new(&path).expect("store");
    let (restored, source) = read_raster(store, "/").expect("read");
    assert!(source.is_none());
    assert_eq!(restored.raster.band("DM").map(|b| b.total()), Some(0.25 * grid.len() as f64));
}

#[test]
fn test_collection_roundtrip_and_year_filter() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let collection = ZarrCollection::new(dir.path().join("QFEDv2p5r1"));
    let writer = ZarrRasterWriter::new(RasterConfig {
        zarr_chunk_size: 16,
        ..Default::default()
    });

    for (year, month) in [(2011, 2), (2010, 12), (2010, 1), (2012, 6)] {
        collection
            .write(&writer, &member(year, month), Some("QFEDv2p5r1"))
            .expect("Failed to write member");
    }

    let entries = collection.entries().expect("Failed to list");
    let months: Vec<_> = entries.iter().map(|e| (e.year, e.month)).collect();
    assert_eq!(months, vec![(2010, 1), (2010, 12), (2011, 2), (2012, 6)]);

    let members = collection.read_years(2010, 2011).expect("Failed to read");
    assert_eq!(members.len(), 3);

    let series = RasterTimeSeries::from_members(small_grid(), &["CO_0-5deg", "BC_0-5deg"], members)
        .expect("Failed to build series");
    let total = series.sum().expect("Failed to sum");
    // three months of the constant band
    assert_eq!(total.get("BC_0-5deg", 0, 0), Some(4.5e9));
    // offsets 1 + 12 + 2
    assert_eq!(total.get("CO_0-5deg", 0, 0), Some(15.0));
}
