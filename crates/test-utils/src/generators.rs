//! Synthetic grids and inventory months.
//!
//! Grids here are global but coarse so whole-pipeline tests stay fast.
//! Values are uniform or follow simple index patterns, which keeps
//! expected totals easy to compute by hand.

use fire_common::time::{days_in_month, month_start};
use fire_common::{AffineTransform, CrsCode, GridDefinition};
use raster::{Band, RasterGrid, TimestampedRaster};

/// GFED land-cover categories in band order.
pub const GFED_CATEGORIES: [&str; 6] = ["SAVA", "BORF", "TEMF", "DEFO", "PEAT", "AGRI"];

/// Global north-up geographic grid with square cells of `cell` degrees.
pub fn global_grid(cell: f64) -> GridDefinition {
    let width = (360.0 / cell).round() as usize;
    let height = (180.0 / cell).round() as usize;
    GridDefinition::new(
        CrsCode::Epsg4326,
        AffineTransform::north_up(-180.0, 90.0, cell, cell),
        width,
        height,
    )
}

/// 5 degree comparison grid (72 x 36).
pub fn comparison_grid() -> GridDefinition {
    global_grid(5.0)
}

/// 2.5 degree grid standing in for the GFED native grid.
pub fn gfed_grid() -> GridDefinition {
    global_grid(2.5)
}

/// Values `1, 2, 3, ...` in row-major order.
///
/// ```
/// use test_utils::indexed_values;
///
/// let data = indexed_values(3, 2);
/// assert_eq!(data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// ```
pub fn indexed_values(width: usize, height: usize) -> Vec<f32> {
    (1..=width * height).map(|v| v as f32).collect()
}

/// Band filled with one value.
pub fn uniform_band(grid: &GridDefinition, name: &str, value: f32) -> Band {
    Band::new(name, vec![value; grid.len()])
}

/// Inputs of one synthetic GFED month.
#[derive(Debug, Clone, Copy)]
pub struct GfedMonth {
    /// Dry matter, kg DM/m²
    pub dm: f32,
    /// Share of dry matter per category, in [`GFED_CATEGORIES`] order
    pub fractions: [f32; 6],
    pub burned_fraction: f32,
    /// Share of burned area from small fires
    pub small_fire_fraction: f32,
}

impl Default for GfedMonth {
    fn default() -> Self {
        Self {
            dm: 0.5,
            fractions: [0.4, 0.1, 0.1, 0.2, 0.1, 0.1],
            burned_fraction: 0.01,
            small_fire_fraction: 0.25,
        }
    }
}

/// One GFED month with uniform dry matter, category fractions, burned
/// area and equal day-of-month fractions (`Day_1` .. `Day_n`).
pub fn gfed_member(grid: &GridDefinition, year: i32, month: u32, inputs: GfedMonth) -> TimestampedRaster {
    let mut bands = vec![uniform_band(grid, "DM", inputs.dm)];
    for (category, fraction) in GFED_CATEGORIES.iter().zip(inputs.fractions) {
        bands.push(uniform_band(grid, &format!("DM_{}", category), fraction));
    }
    bands.push(uniform_band(grid, "burned_fraction", inputs.burned_fraction));
    bands.push(uniform_band(grid, "small_fire_fraction", inputs.small_fire_fraction));

    let days = days_in_month(year, month);
    for day in 1..=days {
        bands.push(uniform_band(grid, &format!("Day_{}", day), 1.0 / days as f32));
    }

    let raster = RasterGrid::new(*grid, bands).expect("synthetic GFED bands fit the grid");
    TimestampedRaster::new(month_start(year, month).expect("valid month"), raster)
}

/// One month of a species inventory with every band set to `value`.
///
/// Band names are the stored names, e.g. `CO_0-5deg`.
pub fn native_member(grid: &GridDefinition, bands: &[&str], year: i32, month: u32, value: f32) -> TimestampedRaster {
    let bands = bands.iter().map(|name| uniform_band(grid, name, value)).collect();
    let raster = RasterGrid::new(*grid, bands).expect("synthetic bands fit the grid");
    TimestampedRaster::new(month_start(year, month).expect("valid month"), raster)
}

/// Every month of `years` as `(year, month)` pairs.
pub fn months_of(start: i32, end: i32) -> impl Iterator<Item = (i32, u32)> {
    (start..=end).flat_map(|y| (1..=12).map(move |m| (y, m)))
}
