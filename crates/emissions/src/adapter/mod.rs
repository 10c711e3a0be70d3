//! Per-inventory normalization onto an analysis grid.
//!
//! Every adapter turns native monthly rasters into a series with one band
//! per canonical species tag, in physical units, on the target grid. Source
//! timestamps pass through unchanged; members after the inventory's final
//! year are flagged preliminary.

mod feer;
mod finn;
mod gfas;
mod gfed;
mod qfed;

pub use feer::FeerAdapter;
pub use finn::FinnAdapter;
pub use gfas::GfasAdapter;
pub use gfed::GfedAdapter;
pub use qfed::QfedAdapter;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fire_common::{FireError, FireResult, GridDefinition, Species, YearRange};
use raster::{reproject, Band, RasterConfig, RasterGrid, RasterTimeSeries, TimestampedRaster};
use tracing::{debug, info, warn};

use crate::config::InventorySettings;
use crate::inventory::Inventory;
use crate::source::RasterSource;

/// Common interface of the inventory adapters.
pub trait InventoryAdapter: Send + Sync {
    fn inventory(&self) -> Inventory;

    /// Whether the inventory provides `species`.
    fn supports(&self, species: &Species) -> bool;

    /// Monthly series of `species` over `years`, one band named by the
    /// species tag.
    ///
    /// Years outside the inventory's coverage produce no members.
    fn fetch(&self, species: &Species, years: &YearRange) -> FireResult<RasterTimeSeries>;
}

/// Everything an adapter needs besides its own band layout.
#[derive(Clone)]
pub struct AdapterContext {
    pub source: Arc<dyn RasterSource>,
    pub settings: InventorySettings,
    /// Grid the output is resampled onto.
    pub target: GridDefinition,
    pub raster: RasterConfig,
}

impl AdapterContext {
    pub fn new(
        source: Arc<dyn RasterSource>,
        settings: InventorySettings,
        target: GridDefinition,
        raster: RasterConfig,
    ) -> Self {
        Self {
            source,
            settings,
            target,
            raster,
        }
    }

    /// Native members inside both `years` and the inventory's coverage,
    /// in timestamp order.
    pub fn load(&self, inventory: Inventory, years: &YearRange) -> FireResult<Vec<TimestampedRaster>> {
        let Some(covered) = self.settings.coverage().clip(years) else {
            debug!(inventory = %inventory, years = %years, "Years outside coverage");
            return Ok(Vec::new());
        };

        let mut members: Vec<_> = self
            .source
            .load_months(inventory, &covered)?
            .into_iter()
            .filter(|m| covered.contains(m.year()))
            .collect();
        members.sort_by_key(|m| m.time);

        let expected = covered.len() * 12;
        if members.len() < expected {
            warn!(
                inventory = %inventory,
                years = %covered,
                expected,
                found = members.len(),
                "Missing inventory months"
            );
        }
        Ok(members)
    }

    /// Resample onto the target grid with the configured method.
    pub fn to_target(&self, raster: &RasterGrid) -> FireResult<RasterGrid> {
        Ok(reproject(
            raster,
            &self.target,
            self.raster.resample_method,
            self.raster.supersample,
        )?)
    }

    /// Stamp an adapted raster with its source time and preliminary flag.
    pub fn stamp(&self, time: DateTime<Utc>, raster: RasterGrid, source_preliminary: bool) -> TimestampedRaster {
        let member = TimestampedRaster::new(time, raster);
        let preliminary =
            source_preliminary || self.settings.coverage().is_preliminary(member.year());
        member.with_preliminary(preliminary)
    }
}

/// Fixed divisor applied to stored values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    pub divisor: f64,
}

impl UnitScale {
    pub fn new(divisor: f64) -> Self {
        Self { divisor }
    }

    /// Stored values to physical units.
    pub fn apply(&self, raster: &RasterGrid) -> RasterGrid {
        raster.divide_scalar(self.divisor)
    }

    /// Stored values to physical units for the named bands; other bands
    /// (fractions, day weights) pass through unchanged.
    pub fn apply_to(&self, raster: &RasterGrid, names: &[&str]) -> FireResult<RasterGrid> {
        let bands = raster
            .bands()
            .iter()
            .map(|band| {
                if names.contains(&band.name.as_str()) {
                    let data = band.data.iter().map(|&v| (v as f64 / self.divisor) as f32).collect();
                    Band::new(band.name.clone(), data)
                } else {
                    band.clone()
                }
            })
            .collect();
        Ok(RasterGrid::new(*raster.grid(), bands)?.with_no_data(raster.is_no_data()))
    }

    /// Physical units back to stored values.
    pub fn invert(&self, raster: &RasterGrid) -> RasterGrid {
        raster.scale(self.divisor)
    }
}

pub(crate) fn unsupported(species: &Species, inventory: Inventory) -> FireError {
    FireError::UnsupportedSpecies {
        species: species.tag().to_string(),
        inventory: inventory.label().to_string(),
    }
}

/// Shared path of the band-per-species inventories: select the native
/// band, unscale, rename to the species tag, resample.
pub(crate) fn fetch_native_band(
    ctx: &AdapterContext,
    inventory: Inventory,
    band: &str,
    species: &Species,
    years: &YearRange,
) -> FireResult<RasterTimeSeries> {
    let tag = species.tag();
    let scale = UnitScale::new(ctx.settings.divisor());
    let mut series = RasterTimeSeries::new(ctx.target, &[tag]);

    for member in ctx.load(inventory, years)? {
        let raster = scale
            .apply(&member.raster.select_band(band)?)
            .rename_band(band, tag)?;
        let raster = ctx.to_target(&raster)?;
        series.push(ctx.stamp(member.time, raster, member.preliminary))?;
    }

    info!(
        inventory = %inventory,
        species = %species,
        months = series.len(),
        "Fetched series"
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_common::grid::grids;
    use fire_common::time::month_start;

    use crate::source::MemorySource;

    fn context(source: Arc<MemorySource>) -> AdapterContext {
        AdapterContext::new(
            source,
            InventorySettings::default_for(Inventory::Qfed25),
            grids::geographic_0p5(),
            RasterConfig::default(),
        )
    }

    #[test]
    fn test_unit_scale_round_trip() {
        let raster = RasterGrid::filled(grids::geographic_0p5(), &["CO"], 123_456.0);
        let scale = UnitScale::new(1e9);
        let back = scale.invert(&scale.apply(&raster));
        let v = back.band_data("CO").unwrap()[0];
        assert!((v - 123_456.0).abs() / 123_456.0 < 1e-6);
    }

    #[test]
    fn test_load_clips_to_coverage() {
        let source = Arc::new(MemorySource::new());
        for year in [2001, 2003, 2017] {
            let raster = RasterGrid::filled(grids::geographic_0p5(), &["CO_0-5deg"], 1.0);
            source
                .insert(
                    Inventory::Qfed25,
                    TimestampedRaster::new(month_start(year, 6).unwrap(), raster),
                )
                .unwrap();
        }
        let ctx = context(source);
        let loaded = ctx
            .load(Inventory::Qfed25, &YearRange::new(2000, 2020).unwrap())
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].year(), 2003);

        assert!(ctx
            .load(Inventory::Qfed25, &YearRange::new(1900, 1901).unwrap())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_stamp_marks_preliminary_years() {
        let source = Arc::new(MemorySource::new());
        let ctx = context(source);
        let raster = RasterGrid::filled(grids::geographic_0p5(), &["CO"], 1.0);
        let late = ctx.stamp(month_start(2017, 1).unwrap(), raster.clone(), false);
        let final_year = ctx.stamp(month_start(2016, 1).unwrap(), raster, false);
        assert!(late.preliminary);
        assert!(!final_year.preliminary);
    }
}
