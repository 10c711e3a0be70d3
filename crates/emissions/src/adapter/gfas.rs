//! GFASv1.2: species bands plus fire radiative power (`FRP`) and
//! injection height (`APT`), 0.5° monthly.

use fire_common::{FireResult, Species, YearRange};
use raster::RasterTimeSeries;

use super::{fetch_native_band, unsupported, AdapterContext, InventoryAdapter};
use crate::inventory::Inventory;

pub struct GfasAdapter {
    ctx: AdapterContext,
}

impl GfasAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    fn band(species: &Species) -> Option<String> {
        Inventory::Gfas12.native_band(species)
    }
}

impl InventoryAdapter for GfasAdapter {
    fn inventory(&self) -> Inventory {
        Inventory::Gfas12
    }

    fn supports(&self, species: &Species) -> bool {
        Self::band(species).is_some()
    }

    fn fetch(&self, species: &Species, years: &YearRange) -> FireResult<RasterTimeSeries> {
        let band = Self::band(species).ok_or_else(|| unsupported(species, self.inventory()))?;
        fetch_native_band(&self.ctx, self.inventory(), &band, species, years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use fire_common::grid::grids;
    use fire_common::time::month_start;
    use raster::{RasterConfig, RasterGrid, TimestampedRaster};

    use crate::config::InventorySettings;
    use crate::source::MemorySource;

    #[test]
    fn test_fetch_scales_and_renames() {
        let grid = grids::geographic_0p5();
        let source = Arc::new(MemorySource::new());
        let names = ["FRP_0-5deg", "CO_0-5deg"];
        for month in 1..=12 {
            let raster = RasterGrid::filled(grid, &names, 2e9);
            source
                .insert(
                    Inventory::Gfas12,
                    TimestampedRaster::new(month_start(2010, month).unwrap(), raster),
                )
                .unwrap();
        }
        let adapter = GfasAdapter::new(AdapterContext::new(
            source,
            InventorySettings::default_for(Inventory::Gfas12),
            grid,
            RasterConfig::default(),
        ));

        let series = adapter
            .fetch(&Species::Co, &YearRange::single(2010))
            .unwrap();
        assert_eq!(series.len(), 12);
        assert_eq!(series.band_names(), ["CO".to_string()]);
        let first = series.first().unwrap();
        assert_eq!(first.time, month_start(2010, 1).unwrap());
        assert!((first.raster.band_data("CO").unwrap()[0] - 2.0).abs() < 1e-6);

        assert!(adapter.supports(&Species::Other("FRP".into())));
        assert!(adapter.fetch(&Species::BurnedArea, &YearRange::single(2010)).is_err());
    }
}
