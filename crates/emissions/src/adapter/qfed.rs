//! QFEDv2.5r1: six species bands, 0.5° monthly.

use fire_common::{FireResult, Species, YearRange};
use raster::RasterTimeSeries;

use super::{fetch_native_band, unsupported, AdapterContext, InventoryAdapter};
use crate::inventory::Inventory;

pub struct QfedAdapter {
    ctx: AdapterContext,
}

impl QfedAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

impl InventoryAdapter for QfedAdapter {
    fn inventory(&self) -> Inventory {
        Inventory::Qfed25
    }

    fn supports(&self, species: &Species) -> bool {
        species.is_multi_inventory()
    }

    fn fetch(&self, species: &Species, years: &YearRange) -> FireResult<RasterTimeSeries> {
        let band = self
            .inventory()
            .native_band(species)
            .filter(|_| self.supports(species))
            .ok_or_else(|| unsupported(species, self.inventory()))?;
        fetch_native_band(&self.ctx, self.inventory(), &band, species, years)
    }
}
