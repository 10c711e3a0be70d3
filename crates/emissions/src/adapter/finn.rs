//! FINNv1.5: species bands plus burned area, 0.5° monthly.

use fire_common::{FireResult, Species, YearRange};
use raster::RasterTimeSeries;

use super::{fetch_native_band, unsupported, AdapterContext, InventoryAdapter};
use crate::inventory::Inventory;

pub struct FinnAdapter {
    ctx: AdapterContext,
}

impl FinnAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    /// Native band name, e.g. `BA_0-5deg` for burned area.
    fn band(species: &Species) -> Option<String> {
        Inventory::Finn15.native_band(species)
    }
}

impl InventoryAdapter for FinnAdapter {
    fn inventory(&self) -> Inventory {
        Inventory::Finn15
    }

    fn supports(&self, species: &Species) -> bool {
        Self::band(species).is_some()
    }

    fn fetch(&self, species: &Species, years: &YearRange) -> FireResult<RasterTimeSeries> {
        let band = Self::band(species).ok_or_else(|| unsupported(species, self.inventory()))?;
        fetch_native_band(&self.ctx, self.inventory(), &band, species, years)
    }
}
