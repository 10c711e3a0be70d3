//! Where native monthly rasters come from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fire_common::{FireError, FireResult, YearRange};
use raster::{RasterGrid, TimestampedRaster, ZarrCollection};
use tracing::debug;

use crate::inventory::Inventory;

/// Collection name of the annual MODIS land-cover product.
pub const LAND_COVER_COLLECTION: &str = "MCD12Q1";

/// Read access to native inventory rasters.
///
/// Implementations return members on the inventory's native grid with
/// its native band names, in any order.
pub trait RasterSource: Send + Sync {
    /// Stored months of `inventory` whose year lies in `years`.
    fn load_months(&self, inventory: Inventory, years: &YearRange)
        -> FireResult<Vec<TimestampedRaster>>;

    /// IGBP land-cover classes for a year, if the source has them.
    fn load_land_cover(&self, _year: i32) -> FireResult<Option<RasterGrid>> {
        Ok(None)
    }
}

/// Zarr collections under a data directory: `{root}/{inventory id}/{YYYY}/{MM}.zarr`.
#[derive(Debug, Clone)]
pub struct ZarrSource {
    root: PathBuf,
}

impl ZarrSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection(&self, inventory: Inventory) -> ZarrCollection {
        ZarrCollection::new(self.root.join(inventory.id()))
    }
}

impl RasterSource for ZarrSource {
    fn load_months(
        &self,
        inventory: Inventory,
        years: &YearRange,
    ) -> FireResult<Vec<TimestampedRaster>> {
        let members = self
            .collection(inventory)
            .read_years(years.start(), years.end())?;
        debug!(
            inventory = %inventory,
            years = %years,
            months = members.len(),
            "Loaded native rasters"
        );
        Ok(members)
    }

    fn load_land_cover(&self, year: i32) -> FireResult<Option<RasterGrid>> {
        let collection = ZarrCollection::new(self.root.join(LAND_COVER_COLLECTION));
        let mut members = collection.read_years(year, year)?;
        Ok(if members.is_empty() {
            None
        } else {
            Some(members.swap_remove(0).raster)
        })
    }
}

/// In-memory source, used for tests and pre-loaded data.
#[derive(Debug, Default)]
pub struct MemorySource {
    months: RwLock<HashMap<Inventory, Vec<TimestampedRaster>>>,
    land_cover: RwLock<HashMap<i32, RasterGrid>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, inventory: Inventory, member: TimestampedRaster) -> FireResult<()> {
        let mut months = self
            .months
            .write()
            .map_err(|_| FireError::Internal("memory source lock poisoned".to_string()))?;
        months.entry(inventory).or_default().push(member);
        Ok(())
    }

    pub fn insert_land_cover(&self, year: i32, classes: RasterGrid) -> FireResult<()> {
        let mut land_cover = self
            .land_cover
            .write()
            .map_err(|_| FireError::Internal("memory source lock poisoned".to_string()))?;
        land_cover.insert(year, classes);
        Ok(())
    }
}

impl RasterSource for MemorySource {
    fn load_months(
        &self,
        inventory: Inventory,
        years: &YearRange,
    ) -> FireResult<Vec<TimestampedRaster>> {
        let months = self
            .months
            .read()
            .map_err(|_| FireError::Internal("memory source lock poisoned".to_string()))?;
        Ok(months
            .get(&inventory)
            .map(|members| {
                members
                    .iter()
                    .filter(|m| years.contains(m.year()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn load_land_cover(&self, year: i32) -> FireResult<Option<RasterGrid>> {
        let land_cover = self
            .land_cover
            .read()
            .map_err(|_| FireError::Internal("memory source lock poisoned".to_string()))?;
        Ok(land_cover.get(&year).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_common::grid::grids;
    use fire_common::time::month_start;

    #[test]
    fn test_memory_source_filters_years() {
        let source = MemorySource::new();
        let grid = grids::geographic_0p5();
        for year in [2009, 2010, 2011] {
            let raster = RasterGrid::filled(grid, &["CO_0-5deg"], 1.0);
            source
                .insert(
                    Inventory::Qfed25,
                    TimestampedRaster::new(month_start(year, 1).unwrap(), raster),
                )
                .unwrap();
        }

        let loaded = source
            .load_months(Inventory::Qfed25, &YearRange::new(2010, 2011).unwrap())
            .unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(source
            .load_months(Inventory::Finn15, &YearRange::single(2010))
            .unwrap()
            .is_empty());
        assert!(source.load_land_cover(2010).unwrap().is_none());
    }

    #[test]
    fn test_zarr_source_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = ZarrSource::new(dir.path());
        let loaded = source
            .load_months(Inventory::Gfed4s, &YearRange::single(2010))
            .unwrap();
        assert!(loaded.is_empty());
        assert_eq!(
            source.collection(Inventory::Gfed4s).root(),
            dir.path().join("GFEDv4s")
        );
    }
}
