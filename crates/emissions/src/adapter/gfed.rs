//! GFEDv4s: dry matter by burning category, converted through an
//! emission-factor table.

use std::sync::Arc;

use fire_common::{FireError, FireResult, Species, YearRange};
use raster::{RasterTimeSeries, TimestampedRaster};
use tracing::info;

use super::{unsupported, AdapterContext, InventoryAdapter, UnitScale};
use crate::ef_model::{EfModel, BA_BAND, BA_BANDS, CATEGORY_BANDS, DM_BAND, TOTAL_BAND};
use crate::ef_table::EfTable;
use crate::inventory::Inventory;

pub struct GfedAdapter {
    ctx: AdapterContext,
    table: Arc<EfTable>,
    model: EfModel,
}

impl GfedAdapter {
    pub fn new(ctx: AdapterContext, table: Arc<EfTable>) -> Self {
        Self {
            ctx,
            table,
            model: EfModel::default(),
        }
    }

    pub fn with_model(mut self, model: EfModel) -> Self {
        self.model = model;
        self
    }

    pub fn table(&self) -> &EfTable {
        &self.table
    }

    /// Band that carries the headline value of a breakdown.
    fn headline_band(species: &Species) -> &'static str {
        if species.is_burned_area() {
            BA_BAND
        } else {
            TOTAL_BAND
        }
    }

    /// Native-grid result for one month: emissions by category, or burned
    /// area and its small-fire share. Only dry matter carries the storage
    /// scale.
    fn convert(&self, species: &Species, member: &TimestampedRaster) -> FireResult<TimestampedRaster> {
        let native = UnitScale::new(self.ctx.settings.divisor())
            .apply_to(&member.raster, &[DM_BAND])?;
        let raster = if species.is_burned_area() {
            self.model.burned_area(&native)?
        } else {
            let factors = self.table.factors(species)?;
            self.model.emissions(&native, &factors)?
        };
        Ok(TimestampedRaster::new(member.time, raster).with_preliminary(member.preliminary))
    }

    /// Monthly breakdown on the target grid.
    ///
    /// Bands are `Total` plus the six categories, or `BA` and
    /// `BA_smallFires` for burned area.
    pub fn fetch_breakdown(&self, species: &Species, years: &YearRange) -> FireResult<RasterTimeSeries> {
        if !self.supports(species) {
            return Err(unsupported(species, self.inventory()));
        }
        let bands: &[&str] = if species.is_burned_area() {
            &BA_BANDS
        } else {
            &CATEGORY_BANDS
        };

        let mut series = RasterTimeSeries::new(self.ctx.target, bands);
        for member in self.ctx.load(self.inventory(), years)? {
            let converted = self.convert(species, &member)?;
            let raster = self.ctx.to_target(&converted.raster)?;
            series.push(self.ctx.stamp(member.time, raster, member.preliminary))?;
        }

        info!(
            inventory = %self.inventory(),
            species = %species,
            table = %self.table.name,
            months = series.len(),
            "Fetched land-cover breakdown"
        );
        Ok(series)
    }

    /// Daily series for one year, from the day-of-month fractions stored
    /// with each month.
    ///
    /// # Errors
    /// `InvalidRange` for years before the first year with day fractions.
    pub fn fetch_daily(&self, species: &Species, year: i32) -> FireResult<RasterTimeSeries> {
        if !self.supports(species) {
            return Err(unsupported(species, self.inventory()));
        }
        let first = self.ctx.settings.daily_first_year.ok_or_else(|| FireError::InvalidParameter {
            param: "daily".to_string(),
            message: format!("{} has no day fractions", self.inventory().label()),
        })?;
        if year < first {
            return Err(FireError::invalid_range(
                year,
                year,
                format!("daily fractions start in {}", first),
            ));
        }

        let headline = Self::headline_band(species);
        let tag = species.tag();
        let mut series = RasterTimeSeries::new(self.ctx.target, &[tag]);
        for member in self.ctx.load(self.inventory(), &YearRange::single(year))? {
            let monthly = self.convert(species, &member)?;
            let monthly = TimestampedRaster::new(
                monthly.time,
                monthly.raster.select_band(headline)?.rename_band(headline, tag)?,
            )
            .with_preliminary(monthly.preliminary);

            for day in self.model.daily(&monthly, &member.raster)? {
                let raster = self.ctx.to_target(&day.raster)?;
                series.push(self.ctx.stamp(day.time, raster, day.preliminary))?;
            }
        }

        info!(
            inventory = %self.inventory(),
            species = %species,
            year,
            days = series.len(),
            "Fetched daily series"
        );
        Ok(series)
    }
}

impl InventoryAdapter for GfedAdapter {
    fn inventory(&self) -> Inventory {
        Inventory::Gfed4s
    }

    fn supports(&self, species: &Species) -> bool {
        species.is_burned_area() || self.table.contains(species)
    }

    fn fetch(&self, species: &Species, years: &YearRange) -> FireResult<RasterTimeSeries> {
        let breakdown = self.fetch_breakdown(species, years)?;
        let headline = Self::headline_band(species);
        let tag = species.tag();
        Ok(breakdown.try_map(*breakdown.grid(), &[tag], |m| {
            let raster = m.raster.select_band(headline)?.rename_band(headline, tag)?;
            Ok(TimestampedRaster::new(m.time, raster).with_preliminary(m.preliminary))
        })?)
    }
}
