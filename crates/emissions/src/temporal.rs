//! Monthly combination and annual aggregation of adapted series.

use std::collections::BTreeMap;

use fire_common::time::{month_start, year_start};
use fire_common::{FireResult, GridDefinition, YearRange};
use raster::{Band, RasterGrid, RasterTimeSeries, TimestampedRaster};
use tracing::debug;

use crate::inventory::Inventory;

/// Combine per-inventory single-band series into one series with a band
/// per inventory, named by inventory id.
///
/// Every month in `years` for which at least one inventory has data gets
/// a member; inventories without that month contribute a NaN band. A
/// month is preliminary if any contributing member is.
pub fn combine_by_month(
    grid: GridDefinition,
    years: &YearRange,
    inputs: &[(Inventory, RasterTimeSeries)],
) -> FireResult<RasterTimeSeries> {
    let names: Vec<&str> = inputs.iter().map(|(inv, _)| inv.id()).collect();
    let mut combined = RasterTimeSeries::new(grid, &names);

    // (year, month) -> per-input member
    let mut months: BTreeMap<(i32, u32), Vec<Option<&TimestampedRaster>>> = BTreeMap::new();
    for (i, (_, series)) in inputs.iter().enumerate() {
        for member in series.iter_years(years.start(), years.end()) {
            let slots = months
                .entry((member.year(), member.month()))
                .or_insert_with(|| vec![None; inputs.len()]);
            slots[i] = Some(member);
        }
    }

    for ((year, month), slots) in months {
        let mut bands = Vec::with_capacity(slots.len());
        let mut preliminary = false;
        for ((inventory, _), slot) in inputs.iter().zip(&slots) {
            let data = match slot {
                Some(member) => {
                    preliminary |= member.preliminary;
                    member
                        .raster
                        .bands()
                        .first()
                        .map(|b| b.data.clone())
                        .unwrap_or_else(|| vec![f32::NAN; grid.len()])
                }
                None => vec![f32::NAN; grid.len()],
            };
            bands.push(Band::new(inventory.id(), data));
        }
        let raster = RasterGrid::new(grid, bands)?;
        combined.push(
            TimestampedRaster::new(month_start(year, month)?, raster).with_preliminary(preliminary),
        )?;
    }

    debug!(months = combined.len(), bands = names.len(), "Combined inventories by month");
    Ok(combined)
}

/// One member per calendar year in `years`: the NaN-aware sum of that
/// year's members, stamped at January 1.
///
/// Years without members are omitted. A year is preliminary if any of
/// its months is.
pub fn by_year(monthly: &RasterTimeSeries, years: &YearRange) -> FireResult<RasterTimeSeries> {
    let mut annual = RasterTimeSeries::new(*monthly.grid(), monthly.band_names());
    for year in years.years() {
        let members = monthly.filter_years(year, year);
        if members.is_empty() {
            continue;
        }
        let total = members.sum()?;
        annual.push(
            TimestampedRaster::new(year_start(year)?, total)
                .with_preliminary(members.any_preliminary()),
        )?;
    }
    debug!(years = annual.len(), "Aggregated by year");
    Ok(annual)
}
