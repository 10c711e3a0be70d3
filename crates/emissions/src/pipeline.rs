//! Request pipeline: region resolution, inventory fetch, temporal
//! aggregation, regional reduction and table assembly.

use std::sync::Arc;

use fire_common::time::representative_map_year;
use fire_common::{FireError, FireResult, GridDefinition, Species, TimeResolution, YearRange};
use raster::{reproject, RasterConfig, RasterTimeSeries, ResampleMethod, TimestampedRaster};
use rayon::prelude::*;
use regions::{Footprint, Region, RegionResolver};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adapter::{
    AdapterContext, FeerAdapter, FinnAdapter, GfasAdapter, GfedAdapter, InventoryAdapter,
    QfedAdapter,
};
use crate::cache::{CacheKey, CacheStats, SeriesCache, SeriesView};
use crate::config::EmissionsConfig;
use crate::ef_model::{BA_BANDS, CATEGORY_BANDS};
use crate::ef_table::EfTable;
use crate::inventory::Inventory;
use crate::lulc::{composition, reclassify, Composition};
use crate::reduce::{reduce_series, Reducer, RegionMask};
use crate::source::{RasterSource, ZarrSource};
use crate::table::OutputTable;
use crate::temporal::{by_year, combine_by_month};

/// Band and column names of an emission-factor comparison.
pub const EF_COMPARE_BANDS: [&str; 2] = ["Old", "New"];

/// One emissions request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsRequest {
    pub species: Species,
    pub years: YearRange,
    pub region: Region,
    /// Inventories to compare, in column order.
    pub inventories: Vec<Inventory>,
    /// Overrides the configured reducer.
    #[serde(default, skip)]
    pub reducer: Option<Reducer>,
}

impl EmissionsRequest {
    /// Request over all five inventories.
    pub fn new(species: Species, years: YearRange, region: Region) -> Self {
        Self {
            species,
            years,
            region,
            inventories: Inventory::ALL.to_vec(),
            reducer: None,
        }
    }

    pub fn with_inventories(mut self, inventories: Vec<Inventory>) -> Self {
        self.inventories = inventories;
        self
    }

    pub fn with_reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = Some(reducer);
        self
    }
}

/// Annual and monthly comparison tables for one request.
#[derive(Debug, Clone)]
pub struct ComparisonTables {
    pub footprint: Footprint,
    pub annual: OutputTable,
    pub monthly: OutputTable,
}

/// Runs emissions requests against a raster source and reference data.
///
/// The pipeline holds only read-only state and a thread-safe cache, so one
/// instance can serve concurrent requests.
pub struct EmissionsPipeline {
    config: EmissionsConfig,
    raster: RasterConfig,
    source: Arc<dyn RasterSource>,
    resolver: Arc<RegionResolver>,
    ef_table: Arc<EfTable>,
    alternative_ef_table: Arc<EfTable>,
    comparison_grid: GridDefinition,
    cache: SeriesCache,
}

impl EmissionsPipeline {
    /// Build a pipeline. EF tables come from the configured YAML files,
    /// or the built-in tables when none are configured.
    pub fn new(
        config: EmissionsConfig,
        raster: RasterConfig,
        source: Arc<dyn RasterSource>,
        resolver: Arc<RegionResolver>,
    ) -> FireResult<Self> {
        config.validate()?;
        raster.validate().map_err(FireError::Config)?;

        let ef_table = match &config.ef_table {
            Some(path) => EfTable::from_path(path)?,
            None => EfTable::gfed4(),
        };
        let alternative_ef_table = match &config.alternative_ef_table {
            Some(path) => EfTable::from_path(path)?,
            None => EfTable::andreae2019(),
        };

        let comparison_grid = config.comparison_grid.resolve()?;
        let cache = SeriesCache::new(config.cache_capacity);
        info!(
            grid = ?config.comparison_grid,
            ef_table = %ef_table.name,
            cache_capacity = config.cache_capacity,
            "Emissions pipeline ready"
        );

        Ok(Self {
            config,
            raster,
            source,
            resolver,
            ef_table: Arc::new(ef_table),
            alternative_ef_table: Arc::new(alternative_ef_table),
            comparison_grid,
            cache,
        })
    }

    /// Pipeline over the Zarr collections in `data_dir` and the reference
    /// data in `reference_dir`.
    pub fn from_config(config: EmissionsConfig, raster: RasterConfig) -> FireResult<Self> {
        let resolver = RegionResolver::from_dir(&config.reference_dir)?;
        let source = Arc::new(ZarrSource::new(&config.data_dir));
        Self::new(config, raster, source, Arc::new(resolver))
    }

    pub fn config(&self) -> &EmissionsConfig {
        &self.config
    }

    pub fn resolver(&self) -> &RegionResolver {
        &self.resolver
    }

    pub fn ef_table(&self) -> &EfTable {
        &self.ef_table
    }

    pub fn alternative_ef_table(&self) -> &EfTable {
        &self.alternative_ef_table
    }

    pub fn comparison_grid(&self) -> &GridDefinition {
        &self.comparison_grid
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resolve a region, mapping lookup failures to `RegionNotFound`.
    pub fn resolve(&self, region: &Region) -> FireResult<Footprint> {
        Ok(self.resolver.resolve(region)?)
    }

    fn context(&self, inventory: Inventory, target: GridDefinition) -> AdapterContext {
        AdapterContext::new(
            Arc::clone(&self.source),
            self.config.settings(inventory),
            target,
            self.raster.clone(),
        )
    }

    fn adapter(&self, inventory: Inventory, target: GridDefinition) -> Box<dyn InventoryAdapter> {
        let ctx = self.context(inventory, target);
        match inventory {
            Inventory::Gfed4s => Box::new(GfedAdapter::new(ctx, Arc::clone(&self.ef_table))),
            Inventory::Finn15 => Box::new(FinnAdapter::new(ctx)),
            Inventory::Gfas12 => Box::new(GfasAdapter::new(ctx)),
            Inventory::Qfed25 => Box::new(QfedAdapter::new(ctx)),
            Inventory::Feer10 => Box::new(FeerAdapter::new(ctx)),
        }
    }

    /// GFED adapter on its configured grid.
    fn gfed(&self, table: Arc<EfTable>) -> FireResult<GfedAdapter> {
        let grid = self.config.settings(Inventory::Gfed4s).grid()?;
        Ok(GfedAdapter::new(self.context(Inventory::Gfed4s, grid), table))
    }

    fn reducer(&self, request: &EmissionsRequest) -> Reducer {
        request.reducer.unwrap_or(Reducer::new(
            self.config.reducer.statistic,
            self.config.reducer.weighting,
        ))
    }

    fn mask(&self, grid: &GridDefinition, footprint: &Footprint, reducer: Reducer) -> RegionMask {
        RegionMask::build(grid, footprint, reducer.weighting, self.config.reducer.coverage_samples)
    }

    /// Requested inventories that provide the species.
    ///
    /// # Errors
    /// `UnsupportedSpecies` if none of them does.
    pub fn supported_inventories(&self, request: &EmissionsRequest) -> FireResult<Vec<Inventory>> {
        let supported: Vec<Inventory> = request
            .inventories
            .iter()
            .copied()
            .filter(|inv| {
                let ok = self.adapter(*inv, self.comparison_grid).supports(&request.species);
                if !ok {
                    warn!(inventory = %inv, species = %request.species, "Inventory does not provide species");
                }
                ok
            })
            .collect();

        if supported.is_empty() {
            return Err(FireError::UnsupportedSpecies {
                species: request.species.tag().to_string(),
                inventory: request
                    .inventories
                    .iter()
                    .map(|i| i.label())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        Ok(supported)
    }

    /// Monthly series on the comparison grid with one band per inventory,
    /// named by inventory id.
    pub fn by_month(&self, request: &EmissionsRequest) -> FireResult<RasterTimeSeries> {
        let inventories = self.supported_inventories(request)?;
        let fetched = inventories
            .par_iter()
            .map(|&inv| -> FireResult<(Inventory, RasterTimeSeries)> {
                let key = CacheKey::new(inv, request.species.tag(), request.years, SeriesView::Comparison);
                let series = self.cache.get_or_try_insert_with(key, || {
                    self.adapter(inv, self.comparison_grid)
                        .fetch(&request.species, &request.years)
                })?;
                Ok((inv, (*series).clone()))
            })
            .collect::<FireResult<Vec<_>>>()?;

        combine_by_month(self.comparison_grid, &request.years, &fetched)
    }

    /// Annual sums of [`Self::by_month`], stamped at January 1.
    pub fn by_year(&self, request: &EmissionsRequest) -> FireResult<RasterTimeSeries> {
        by_year(&self.by_month(request)?, &request.years)
    }

    fn inventory_table(
        &self,
        request: &EmissionsRequest,
        footprint: &Footprint,
        resolution: TimeResolution,
    ) -> FireResult<OutputTable> {
        let monthly = self.by_month(request)?;
        let series = match resolution {
            TimeResolution::Annual => by_year(&monthly, &request.years)?,
            _ => monthly,
        };
        let reducer = self.reducer(request);
        let mask = self.mask(&self.comparison_grid, footprint, reducer);
        let results = reduce_series(&series, &mask, reducer)?;

        let columns: Vec<(&str, &str)> = series
            .band_names()
            .iter()
            .filter_map(|id| id.parse::<Inventory>().ok())
            .map(|inv| (inv.id(), inv.label()))
            .collect();
        Ok(OutputTable::from_results(resolution, &columns, &results))
    }

    /// Annual multi-inventory table: `Time` plus one column per inventory.
    pub fn annual_table(&self, request: &EmissionsRequest) -> FireResult<OutputTable> {
        let footprint = self.resolve(&request.region)?;
        self.inventory_table(request, &footprint, TimeResolution::Annual)
    }

    /// Monthly multi-inventory table.
    pub fn monthly_table(&self, request: &EmissionsRequest) -> FireResult<OutputTable> {
        let footprint = self.resolve(&request.region)?;
        self.inventory_table(request, &footprint, TimeResolution::Monthly)
    }

    /// Annual and monthly comparison across inventories.
    ///
    /// The region is resolved before any raster is read.
    pub fn compare(&self, request: &EmissionsRequest) -> FireResult<ComparisonTables> {
        let footprint = self.resolve(&request.region)?;
        let annual = self.inventory_table(request, &footprint, TimeResolution::Annual)?;
        let monthly = self.inventory_table(request, &footprint, TimeResolution::Monthly)?;
        info!(
            species = %request.species,
            region = %footprint.name,
            years = %request.years,
            annual_rows = annual.len(),
            monthly_rows = monthly.len(),
            "Compared inventories"
        );
        Ok(ComparisonTables {
            footprint,
            annual,
            monthly,
        })
    }

    /// GFED emissions by land-cover category: `Total` plus the six
    /// categories, or `BA` and `BA_smallFires` for burned area.
    pub fn land_cover(&self, request: &EmissionsRequest, resolution: TimeResolution) -> FireResult<OutputTable> {
        let footprint = self.resolve(&request.region)?;
        let adapter = self.gfed(Arc::clone(&self.ef_table))?;
        let key = CacheKey::new(
            Inventory::Gfed4s,
            request.species.tag(),
            request.years,
            SeriesView::Breakdown(self.ef_table.name.clone()),
        );
        let monthly = self.cache.get_or_try_insert_with(key, || {
            adapter.fetch_breakdown(&request.species, &request.years)
        })?;

        let series = match resolution {
            TimeResolution::Annual => by_year(&monthly, &request.years)?,
            _ => (*monthly).clone(),
        };
        let reducer = self.reducer(request);
        let mask = self.mask(series.grid(), &footprint, reducer);
        let results = reduce_series(&series, &mask, reducer)?;

        let bands: &[&str] = if request.species.is_burned_area() {
            &BA_BANDS
        } else {
            &CATEGORY_BANDS
        };
        let columns: Vec<(&str, &str)> = bands.iter().map(|b| (*b, *b)).collect();
        Ok(OutputTable::from_results(resolution, &columns, &results))
    }

    /// Daily GFED series for one year; one column named by the species tag.
    pub fn daily(&self, species: &Species, year: i32, region: &Region) -> FireResult<OutputTable> {
        let footprint = self.resolve(region)?;
        let series = self.gfed(Arc::clone(&self.ef_table))?.fetch_daily(species, year)?;
        let reducer = Reducer::new(self.config.reducer.statistic, self.config.reducer.weighting);
        let mask = self.mask(series.grid(), &footprint, reducer);
        let results = reduce_series(&series, &mask, reducer)?;
        let tag = species.tag();
        Ok(OutputTable::from_results(TimeResolution::Daily, &[(tag, tag)], &results))
    }

    /// GFED emissions with the current (`Old`) and updated (`New`)
    /// emission-factor tables over the same dry matter.
    pub fn ef_compare(&self, request: &EmissionsRequest, resolution: TimeResolution) -> FireResult<OutputTable> {
        let footprint = self.resolve(&request.region)?;
        let species = &request.species;
        for table in [&self.ef_table, &self.alternative_ef_table] {
            table.factors(species)?;
        }

        let fetch = |table: &Arc<EfTable>| -> FireResult<Arc<RasterTimeSeries>> {
            let adapter = self.gfed(Arc::clone(table))?;
            let key = CacheKey::new(
                Inventory::Gfed4s,
                species.tag(),
                request.years,
                SeriesView::EfTable(table.name.clone()),
            );
            self.cache
                .get_or_try_insert_with(key, || adapter.fetch(species, &request.years))
        };
        let old = fetch(&self.ef_table)?;
        let new = fetch(&self.alternative_ef_table)?;

        let monthly = pair_by_time(&old, &new)?;
        let series = match resolution {
            TimeResolution::Annual => by_year(&monthly, &request.years)?,
            _ => monthly,
        };
        let reducer = self.reducer(request);
        let mask = self.mask(series.grid(), &footprint, reducer);
        let results = reduce_series(&series, &mask, reducer)?;
        let columns: Vec<(&str, &str)> = EF_COMPARE_BANDS.iter().map(|b| (*b, *b)).collect();
        Ok(OutputTable::from_results(resolution, &columns, &results))
    }

    /// Land-cover class shares over a region, for the representative
    /// land-cover year of `years`.
    ///
    /// `None` when the source has no land cover for that year.
    pub fn land_cover_composition(&self, years: &YearRange, region: &Region) -> FireResult<Option<Composition>> {
        let footprint = self.resolve(region)?;
        let map_year = representative_map_year(years, self.config.land_cover_last_year);
        let Some(igbp) = self.source.load_land_cover(map_year)? else {
            debug!(year = map_year, "No land cover for year");
            return Ok(None);
        };

        let classes = reproject(
            &reclassify(&igbp)?,
            &self.comparison_grid,
            ResampleMethod::Nearest,
            1,
        )?;
        let mask = self.mask(&self.comparison_grid, &footprint, Reducer::default());
        Ok(Some(composition(&classes, &mask, map_year)?))
    }
}

/// Pair two single-band series on identical timestamps into `Old`/`New`
/// bands. Timestamps present in only one series are skipped.
fn pair_by_time(old: &RasterTimeSeries, new: &RasterTimeSeries) -> FireResult<RasterTimeSeries> {
    let mut paired = RasterTimeSeries::new(*old.grid(), &EF_COMPARE_BANDS);
    for a in old.iter() {
        let Some(b) = new.iter().find(|m| m.time == a.time) else {
            continue;
        };
        let a_band = a.raster.clone().rename_bands(&[EF_COMPARE_BANDS[0]])?;
        let b_band = b.raster.clone().rename_bands(&[EF_COMPARE_BANDS[1]])?;
        let raster = raster::RasterGrid::combine_bands(&[a_band, b_band])?;
        paired.push(
            TimestampedRaster::new(a.time, raster).with_preliminary(a.preliminary || b.preliminary),
        )?;
    }
    Ok(paired)
}
