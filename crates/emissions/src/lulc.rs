//! Aggregated land-cover classes from MODIS MCD12Q1 (IGBP scheme).

use std::fmt;

use fire_common::{FireError, FireResult};
use raster::{Band, RasterGrid};
use serde::Serialize;

use crate::reduce::RegionMask;

/// Band name of the reclassified raster.
pub const LAND_COVER_BAND: &str = "LULC";
/// Band holding IGBP classes in the MCD12Q1 collection.
pub const IGBP_BAND: &str = "LC_Type1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LandCoverClass {
    /// Boreal forest
    Boreal = 1,
    /// Tropical forest
    Tropical = 2,
    /// Temperate forest
    Temperate = 3,
    /// Woody savanna and shrubland
    WoodySavanna = 4,
    /// Savanna and grassland
    SavannaGrassland = 5,
    Cropland = 6,
    Urban = 7,
}

impl LandCoverClass {
    pub const ALL: [LandCoverClass; 7] = [
        LandCoverClass::Boreal,
        LandCoverClass::Tropical,
        LandCoverClass::Temperate,
        LandCoverClass::WoodySavanna,
        LandCoverClass::SavannaGrassland,
        LandCoverClass::Cropland,
        LandCoverClass::Urban,
    ];

    pub fn abbrev(&self) -> &'static str {
        match self {
            LandCoverClass::Boreal => "BOR",
            LandCoverClass::Tropical => "TROP",
            LandCoverClass::Temperate => "TEMP",
            LandCoverClass::WoodySavanna => "WS",
            LandCoverClass::SavannaGrassland => "SG",
            LandCoverClass::Cropland => "CROP",
            LandCoverClass::Urban => "URBAN",
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl fmt::Display for LandCoverClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// Aggregated class of an IGBP class, if it has one.
///
/// Water, wetlands, snow and barren land have none.
pub fn reclassify_igbp(igbp: u8) -> Option<LandCoverClass> {
    match igbp {
        1 | 3 => Some(LandCoverClass::Boreal),
        2 => Some(LandCoverClass::Tropical),
        4 | 5 => Some(LandCoverClass::Temperate),
        6..=8 => Some(LandCoverClass::WoodySavanna),
        9..=11 | 14 | 16 => Some(LandCoverClass::SavannaGrassland),
        12 => Some(LandCoverClass::Cropland),
        13 => Some(LandCoverClass::Urban),
        _ => None,
    }
}

/// Reclassify the first band of an IGBP raster; unclassified cells are NaN.
pub fn reclassify(igbp: &RasterGrid) -> FireResult<RasterGrid> {
    let source = igbp
        .band(IGBP_BAND)
        .or_else(|| igbp.bands().first())
        .map(|b| b.data.as_slice())
        .unwrap_or_default();
    let data = source
        .iter()
        .map(|v| {
            if v.is_nan() || *v < 0.0 || *v > u8::MAX as f32 {
                return f32::NAN;
            }
            reclassify_igbp(v.round() as u8).map_or(f32::NAN, |c| c.code() as f32)
        })
        .collect();
    Ok(RasterGrid::new(*igbp.grid(), vec![Band::new(LAND_COVER_BAND, data)])?)
}

/// Share of a region's covered area in each aggregated class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composition {
    pub year: i32,
    /// (class, fraction of classified area), every class listed
    pub fractions: Vec<(LandCoverClass, f64)>,
}

/// Area-weighted class composition of a reclassified raster over a mask.
pub fn composition(classes: &RasterGrid, mask: &RegionMask, year: i32) -> FireResult<Composition> {
    let grid = mask.grid();
    if !classes.grid().matches(grid) {
        return Err(FireError::GridMismatch(
            "land-cover raster is not on the region mask grid".to_string(),
        ));
    }
    let data = classes.band_data(LAND_COVER_BAND)?;

    let mut totals = [0.0f64; 7];
    for (idx, weight) in mask.cells() {
        let v = data[idx];
        if v.is_nan() {
            continue;
        }
        if let Some(class) = LandCoverClass::from_code(v as u8) {
            let (col, row) = (idx % grid.width, idx / grid.width);
            totals[class.code() as usize - 1] += weight * grid.cell_area_m2(col, row);
        }
    }

    let sum: f64 = totals.iter().sum();
    let fractions = LandCoverClass::ALL
        .into_iter()
        .map(|c| {
            let t = totals[c.code() as usize - 1];
            (c, if sum > 0.0 { t / sum } else { 0.0 })
        })
        .collect();
    Ok(Composition { year, fractions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_common::{AffineTransform, CrsCode, GridDefinition};
    use regions::{Footprint, Geometry, Region};

    use crate::reduce::Weighting;

    #[test]
    fn test_igbp_mapping() {
        let expected = [
            (1, Some(1)),
            (2, Some(2)),
            (3, Some(1)),
            (4, Some(3)),
            (5, Some(3)),
            (6, Some(4)),
            (8, Some(4)),
            (9, Some(5)),
            (11, Some(5)),
            (12, Some(6)),
            (13, Some(7)),
            (14, Some(5)),
            (15, None),
            (16, Some(5)),
            (17, None),
        ];
        for (igbp, class) in expected {
            assert_eq!(reclassify_igbp(igbp).map(|c| c.code()), class, "IGBP {}", igbp);
        }
    }

    #[test]
    fn test_composition() {
        let grid = GridDefinition::new(
            CrsCode::Epsg4326,
            AffineTransform::north_up(0.0, 1.0, 1.0, 1.0),
            4,
            1,
        );
        let igbp = RasterGrid::single_band(grid, IGBP_BAND, vec![2.0, 2.0, 12.0, 17.0]).unwrap();
        let classes = reclassify(&igbp).unwrap();
        assert!(classes.band_data(LAND_COVER_BAND).unwrap()[3].is_nan());

        let ring = vec![[0.0, 0.0], [4.0, 0.0], [4.0, 1.0], [0.0, 1.0]];
        let footprint = Footprint {
            region: Region::Polygon { ring: ring.clone() },
            name: "Custom".into(),
            geometry: Geometry::polygon(ring).unwrap(),
        };
        let mask = RegionMask::build(&grid, &footprint, Weighting::Unweighted, 1);
        let comp = composition(&classes, &mask, 2010).unwrap();
        let trop = comp.fractions[1].1;
        let crop = comp.fractions[5].1;
        assert!((trop - 2.0 / 3.0).abs() < 1e-6);
        assert!((crop - 1.0 / 3.0).abs() < 1e-6);
    }
}
