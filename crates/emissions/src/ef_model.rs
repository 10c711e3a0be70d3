//! Land-cover emission-factor model for the dry-matter inventory.
//!
//! A GFED member carries dry matter burned (`DM`, kg/m²), the share of
//! that dry matter in each burning category (`DM_SAVA` .. `DM_AGRI`),
//! the burned fraction of each cell, the small-fire share of it and
//! per-day fractions of the monthly total (`Day_1` .. `Day_31`).
//!
//! Emissions per category are
//! `DM × fraction × EF × cell area × 1e-12` Tg, and `Total` is their sum.

use chrono::Datelike;
use fire_common::time::{date_start, days_in_month};
use fire_common::{FireError, FireResult};
use raster::{Band, RasterGrid, TimestampedRaster};
use tracing::warn;

use crate::ef_table::{CategoryFactors, LandCover};

/// Dry matter burned band.
pub const DM_BAND: &str = "DM";
/// Fraction of each cell burned during the month.
pub const BURNED_FRACTION_BAND: &str = "burned_fraction";
/// Share of the burned area attributed to small fires.
pub const SMALL_FIRE_FRACTION_BAND: &str = "small_fire_fraction";
/// Total over all categories.
pub const TOTAL_BAND: &str = "Total";
pub const BA_BAND: &str = "BA";
pub const BA_SMALL_FIRES_BAND: &str = "BA_smallFires";

/// Output bands of [`EfModel::emissions`]: `Total` then the categories.
pub const CATEGORY_BANDS: [&str; 7] = ["Total", "SAVA", "BORF", "TEMF", "DEFO", "PEAT", "AGRI"];
/// Output bands of [`EfModel::burned_area`].
pub const BA_BANDS: [&str; 2] = [BA_BAND, BA_SMALL_FIRES_BAND];

/// grams to teragrams
const G_TO_TG: f64 = 1e-12;
/// m² to thousands of km²
const M2_TO_KKM2: f64 = 1e-9;

/// Name of the day-fraction band for a day of the month.
pub fn day_band(day: u32) -> String {
    format!("Day_{}", day)
}

/// Converts dry matter into species emissions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfModel {
    /// Allowed excess of the category fractions over 1.
    pub fraction_tolerance: f64,
}

impl Default for EfModel {
    fn default() -> Self {
        Self {
            fraction_tolerance: 1e-3,
        }
    }
}

impl EfModel {
    pub fn new(fraction_tolerance: f64) -> Self {
        Self { fraction_tolerance }
    }

    /// Per-category emissions in Tg per cell.
    ///
    /// Returns a raster with [`CATEGORY_BANDS`]. Negative contributions
    /// are clamped to zero. A cell with NaN dry matter is NaN in every
    /// band; a NaN fraction contributes nothing.
    pub fn emissions(&self, member: &RasterGrid, factors: &CategoryFactors) -> FireResult<RasterGrid> {
        let grid = *member.grid();
        let dm = member.band_data(DM_BAND)?;
        let fractions = LandCover::ALL
            .iter()
            .map(|c| member.band_data(&c.dm_band()))
            .collect::<Result<Vec<_>, _>>()?;
        let areas = grid.cell_areas();

        let mut total = vec![0.0f32; grid.len()];
        let mut categories = vec![vec![0.0f32; grid.len()]; LandCover::ALL.len()];
        let mut clamped = 0usize;
        let mut over_allocated = 0usize;

        for i in 0..grid.len() {
            let dm_i = dm[i] as f64;
            if dm_i.is_nan() {
                total[i] = f32::NAN;
                categories.iter_mut().for_each(|c| c[i] = f32::NAN);
                continue;
            }

            let mut fraction_sum = 0.0;
            let mut cell_total = 0.0;
            for (c, fraction) in fractions.iter().enumerate() {
                let f = fraction[i] as f64;
                if f.is_nan() {
                    continue;
                }
                fraction_sum += f;
                let mut e = dm_i * f * factors[c] * areas[i] * G_TO_TG;
                if e < 0.0 {
                    e = 0.0;
                    clamped += 1;
                }
                categories[c][i] = e as f32;
                cell_total += e;
            }
            if fraction_sum > 1.0 + self.fraction_tolerance {
                over_allocated += 1;
            }
            total[i] = cell_total as f32;
        }

        if over_allocated > 0 {
            warn!(
                cells = over_allocated,
                tolerance = self.fraction_tolerance,
                "Land-cover fractions sum above one"
            );
        }
        if clamped > 0 {
            warn!(values = clamped, "Clamped negative emissions to zero");
        }

        let mut bands = vec![Band::new(TOTAL_BAND, total)];
        bands.extend(
            LandCover::ALL
                .iter()
                .zip(categories)
                .map(|(c, data)| Band::new(c.abbrev(), data)),
        );
        Ok(RasterGrid::new(grid, bands)?.with_no_data(member.is_no_data()))
    }

    /// Burned area and its small-fire share, in thousands of km² per cell.
    pub fn burned_area(&self, member: &RasterGrid) -> FireResult<RasterGrid> {
        let grid = *member.grid();
        let burned = member.band_data(BURNED_FRACTION_BAND)?;
        let small = member.band_data(SMALL_FIRE_FRACTION_BAND)?;
        let areas = grid.cell_areas();

        let mut clamped = 0usize;
        let mut ba = Vec::with_capacity(grid.len());
        let mut ba_small = Vec::with_capacity(grid.len());
        for i in 0..grid.len() {
            let mut value = burned[i] as f64 * areas[i] * M2_TO_KKM2;
            if value < 0.0 {
                value = 0.0;
                clamped += 1;
            }
            let mut small_value = value * small[i] as f64;
            if small_value < 0.0 {
                small_value = 0.0;
                clamped += 1;
            }
            ba.push(value as f32);
            ba_small.push(small_value as f32);
        }
        if clamped > 0 {
            warn!(values = clamped, "Clamped negative burned area to zero");
        }

        let bands = vec![Band::new(BA_BAND, ba), Band::new(BA_SMALL_FIRES_BAND, ba_small)];
        Ok(RasterGrid::new(grid, bands)?.with_no_data(member.is_no_data()))
    }

    /// Spread a monthly raster across the days of its month.
    ///
    /// Every band of `monthly` is multiplied by the `Day_d` band of
    /// `fractions` for each day of the month; each result is stamped at
    /// midnight of its date and keeps the monthly preliminary flag.
    pub fn daily(
        &self,
        monthly: &TimestampedRaster,
        fractions: &RasterGrid,
    ) -> FireResult<Vec<TimestampedRaster>> {
        monthly.raster.check_same_grid(fractions)?;
        let year = monthly.time.year();
        let month = monthly.time.month();
        let days = days_in_month(year, month);
        if days == 0 {
            return Err(FireError::Internal(format!(
                "no calendar days for {:04}-{:02}",
                year, month
            )));
        }

        (1..=days)
            .map(|day| -> FireResult<TimestampedRaster> {
                let weights = fractions.band_data(&day_band(day))?;
                let bands = monthly
                    .raster
                    .bands()
                    .iter()
                    .map(|band| {
                        let data = band
                            .data
                            .iter()
                            .zip(weights)
                            .map(|(v, w)| v * w)
                            .collect();
                        Band::new(band.name.clone(), data)
                    })
                    .collect();
                let raster = RasterGrid::new(*monthly.raster.grid(), bands)?
                    .with_no_data(monthly.raster.is_no_data());
                Ok(TimestampedRaster::new(date_start(year, month, day)?, raster)
                    .with_preliminary(monthly.preliminary))
            })
            .collect()
    }
}
