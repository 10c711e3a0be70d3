//! FEERv1.0-G1.2: six species bands, 0.5° monthly.
//!
//! FEER derives its emissions from GFAS fire radiative power, but it
//! publishes only the species fields.

use fire_common::{FireResult, Species, YearRange};
use raster::RasterTimeSeries;

use super::{fetch_native_band, unsupported, AdapterContext, InventoryAdapter};
use crate::inventory::Inventory;

pub struct FeerAdapter {
    ctx: AdapterContext,
}

impl FeerAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

impl InventoryAdapter for FeerAdapter {
    fn inventory(&self) -> Inventory {
        Inventory::Feer10
    }

    fn supports(&self, species: &Species) -> bool {
        species.is_multi_inventory()
    }

    fn fetch(&self, species: &Species, years: &YearRange) -> FireResult<RasterTimeSeries> {
        if !self.supports(species) {
            return Err(unsupported(species, self.inventory()));
        }
        let band = self
            .inventory()
            .native_band(species)
            .ok_or_else(|| unsupported(species, self.inventory()))?;
        fetch_native_band(&self.ctx, self.inventory(), &band, species, years)
    }
}
