//! Core raster types.

use std::collections::HashSet;

use fire_common::GridDefinition;
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};

/// One named channel of a raster, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub data: Vec<f32>,
}

impl Band {
    pub fn new(name: impl Into<String>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Sum of the non-NaN values.
    pub fn total(&self) -> f64 {
        self.data
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| v as f64)
            .sum()
    }
}

/// A multi-band gridded field.
///
/// Every band shares the grid definition and holds exactly
/// `grid.width * grid.height` values. Missing cells are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    grid: GridDefinition,
    bands: Vec<Band>,
    no_data: bool,
}

impl RasterGrid {
    /// Build a raster, checking band shapes and name uniqueness.
    pub fn new(grid: GridDefinition, bands: Vec<Band>) -> Result<Self> {
        if bands.is_empty() {
            return Err(RasterError::grid_mismatch("raster needs at least one band"));
        }
        let expected = grid.len();
        let mut seen = HashSet::new();
        for band in &bands {
            if band.data.len() != expected {
                return Err(RasterError::grid_mismatch(format!(
                    "band '{}' has {} values, grid {}x{} needs {}",
                    band.name,
                    band.data.len(),
                    grid.width,
                    grid.height,
                    expected
                )));
            }
            if !seen.insert(band.name.as_str()) {
                return Err(RasterError::grid_mismatch(format!(
                    "duplicate band '{}'",
                    band.name
                )));
            }
        }
        Ok(Self {
            grid,
            bands,
            no_data: false,
        })
    }

    /// Build a single-band raster.
    pub fn single_band(grid: GridDefinition, name: impl Into<String>, data: Vec<f32>) -> Result<Self> {
        Self::new(grid, vec![Band::new(name, data)])
    }

    /// Raster with every cell of every band set to `value`.
    pub fn filled<S: AsRef<str>>(grid: GridDefinition, names: &[S], value: f32) -> Self {
        let bands = names
            .iter()
            .map(|n| Band::new(n.as_ref(), vec![value; grid.len()]))
            .collect();
        Self {
            grid,
            bands,
            no_data: false,
        }
    }

    /// Zero-valued raster flagged as carrying no observations.
    pub fn no_data<S: AsRef<str>>(grid: GridDefinition, names: &[S]) -> Self {
        let mut raster = Self::filled(grid, names, 0.0);
        raster.no_data = true;
        raster
    }

    pub fn grid(&self) -> &GridDefinition {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    /// Number of cells per band.
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// True when no source observations contributed to this raster.
    pub fn is_no_data(&self) -> bool {
        self.no_data
    }

    pub fn with_no_data(mut self, no_data: bool) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn band(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|b| b.name == name)
    }

    /// Values of a band.
    pub fn band_data(&self, name: &str) -> Result<&[f32]> {
        self.band(name)
            .map(|b| b.data.as_slice())
            .ok_or_else(|| RasterError::BandNotFound(name.to_string()))
    }

    /// Value of a band at a cell.
    pub fn get(&self, name: &str, col: usize, row: usize) -> Option<f32> {
        if col >= self.grid.width || row >= self.grid.height {
            return None;
        }
        self.band(name)
            .map(|b| b.data[self.grid.flat_index(col, row)])
    }

    /// Value of a band at a CRS coordinate.
    pub fn value_at(&self, name: &str, x: f64, y: f64) -> Option<f32> {
        let (col, row) = self.grid.cell_at(x, y)?;
        self.get(name, col, row)
    }

    /// New raster holding only the named band.
    pub fn select_band(&self, name: &str) -> Result<RasterGrid> {
        let band = self
            .band(name)
            .ok_or_else(|| RasterError::BandNotFound(name.to_string()))?;
        Ok(Self {
            grid: self.grid,
            bands: vec![band.clone()],
            no_data: self.no_data,
        })
    }

    /// New raster holding the named bands in the given order.
    pub fn select_bands<S: AsRef<str>>(&self, names: &[S]) -> Result<RasterGrid> {
        let bands = names
            .iter()
            .map(|n| {
                self.band(n.as_ref())
                    .cloned()
                    .ok_or_else(|| RasterError::BandNotFound(n.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(self.grid, bands)?.with_no_data(self.no_data))
    }

    /// Rename one band.
    pub fn rename_band(mut self, from: &str, to: impl Into<String>) -> Result<Self> {
        let to = to.into();
        if from != to && self.band(&to).is_some() {
            return Err(RasterError::grid_mismatch(format!(
                "cannot rename '{}' to existing band '{}'",
                from, to
            )));
        }
        let band = self
            .bands
            .iter_mut()
            .find(|b| b.name == from)
            .ok_or_else(|| RasterError::BandNotFound(from.to_string()))?;
        band.name = to;
        Ok(self)
    }

    /// Rename every band positionally.
    pub fn rename_bands<S: AsRef<str>>(self, names: &[S]) -> Result<Self> {
        if names.len() != self.bands.len() {
            return Err(RasterError::grid_mismatch(format!(
                "{} names supplied for {} bands",
                names.len(),
                self.bands.len()
            )));
        }
        let no_data = self.no_data;
        let bands = self
            .bands
            .into_iter()
            .zip(names)
            .map(|(b, n)| Band::new(n.as_ref(), b.data))
            .collect();
        Ok(Self::new(self.grid, bands)?.with_no_data(no_data))
    }

    /// Stack the bands of several rasters side by side.
    ///
    /// All inputs must share the grid definition, and band names must
    /// stay unique across the result. The result carries no data only
    /// when every input does.
    pub fn combine_bands(grids: &[RasterGrid]) -> Result<RasterGrid> {
        let first = grids
            .first()
            .ok_or_else(|| RasterError::grid_mismatch("no rasters to combine"))?;
        for other in &grids[1..] {
            first.check_same_grid(other)?;
        }
        let bands = grids.iter().flat_map(|g| g.bands.iter().cloned()).collect();
        let no_data = grids.iter().all(|g| g.no_data);
        Ok(Self::new(first.grid, bands)?.with_no_data(no_data))
    }

    /// Error unless both rasters sit on the same grid.
    pub fn check_same_grid(&self, other: &RasterGrid) -> Result<()> {
        if !self.grid.matches(&other.grid) {
            return Err(RasterError::grid_mismatch(format!(
                "grid {}x{} {} {:?} does not match {}x{} {} {:?}",
                self.grid.width,
                self.grid.height,
                self.grid.crs,
                self.grid.transform.terms(),
                other.grid.width,
                other.grid.height,
                other.grid.crs,
                other.grid.transform.terms()
            )));
        }
        Ok(())
    }

    /// Error unless both rasters share grid and band names in order.
    pub fn check_compatible(&self, other: &RasterGrid) -> Result<()> {
        self.check_same_grid(other)?;
        if self.band_names() != other.band_names() {
            return Err(RasterError::grid_mismatch(format!(
                "bands {:?} do not match {:?}",
                self.band_names(),
                other.band_names()
            )));
        }
        Ok(())
    }

    pub fn into_bands(self) -> Vec<Band> {
        self.bands
    }

    /// Assemble without validation; callers guarantee band shapes.
    pub(crate) fn from_parts(grid: GridDefinition, bands: Vec<Band>, no_data: bool) -> Self {
        Self {
            grid,
            bands,
            no_data,
        }
    }

    pub(crate) fn bands_mut(&mut self) -> &mut [Band] {
        &mut self.bands
    }
}
