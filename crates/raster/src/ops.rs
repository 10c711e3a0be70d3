//! Element-wise, band-wise raster arithmetic.
//!
//! Binary operations pair bands by position and require matching band
//! names, except when the right-hand raster has a single band, which is
//! then broadcast over every band of the left-hand raster (e.g. a cell
//! area grid).

use crate::error::{RasterError, Result};
use crate::types::{Band, RasterGrid};

impl RasterGrid {
    /// Apply `f` to every cell of every band.
    pub fn map<F>(&self, f: F) -> RasterGrid
    where
        F: Fn(f32) -> f32,
    {
        let mut out = self.clone();
        for band in out.bands_mut() {
            for v in band.data.iter_mut() {
                *v = f(*v);
            }
        }
        out
    }

    /// Combine two rasters cell by cell.
    pub fn zip_with<F>(&self, other: &RasterGrid, f: F) -> Result<RasterGrid>
    where
        F: Fn(f32, f32) -> f32,
    {
        self.check_same_grid(other)?;

        let broadcast = other.band_count() == 1 && self.band_count() > 1;
        if !broadcast && self.band_names() != other.band_names() {
            return Err(RasterError::grid_mismatch(format!(
                "bands {:?} cannot be combined with {:?}",
                self.band_names(),
                other.band_names()
            )));
        }

        let mut out = self.clone();
        for (i, band) in out.bands_mut().iter_mut().enumerate() {
            let rhs = if broadcast {
                &other.bands()[0]
            } else {
                &other.bands()[i]
            };
            for (v, r) in band.data.iter_mut().zip(&rhs.data) {
                *v = f(*v, *r);
            }
        }
        Ok(out.with_no_data(self.is_no_data() && other.is_no_data()))
    }

    pub fn add(&self, other: &RasterGrid) -> Result<RasterGrid> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn subtract(&self, other: &RasterGrid) -> Result<RasterGrid> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn multiply(&self, other: &RasterGrid) -> Result<RasterGrid> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Division by zero yields NaN (a masked cell).
    pub fn divide(&self, other: &RasterGrid) -> Result<RasterGrid> {
        self.zip_with(other, |a, b| if b == 0.0 { f32::NAN } else { a / b })
    }

    /// 1.0 where the value exceeds `threshold`, else 0.0. NaN stays NaN.
    pub fn threshold(&self, threshold: f32) -> RasterGrid {
        self.map(|v| {
            if v.is_nan() {
                v
            } else if v > threshold {
                1.0
            } else {
                0.0
            }
        })
    }

    /// Multiply every cell by a constant.
    pub fn scale(&self, factor: f64) -> RasterGrid {
        self.map(|v| (v as f64 * factor) as f32)
    }

    /// Divide every cell by a constant.
    pub fn divide_scalar(&self, divisor: f64) -> RasterGrid {
        self.map(|v| (v as f64 / divisor) as f32)
    }

    /// Replace negative values with zero, leaving NaN untouched.
    ///
    /// Returns the clamped raster and the number of cells changed.
    pub fn clamp_non_negative(&self) -> (RasterGrid, usize) {
        let mut clamped = 0;
        let mut out = self.clone();
        for band in out.bands_mut() {
            for v in band.data.iter_mut() {
                if *v < 0.0 {
                    *v = 0.0;
                    clamped += 1;
                }
            }
        }
        (out, clamped)
    }

    /// Single-band raster holding the cell-wise sum of all bands.
    pub fn sum_bands(&self, name: impl Into<String>) -> RasterGrid {
        let mut total = vec![0.0f32; self.len()];
        for band in self.bands() {
            for (t, v) in total.iter_mut().zip(&band.data) {
                *t += *v;
            }
        }
        RasterGrid::from_parts(*self.grid(), vec![Band::new(name, total)], self.is_no_data())
    }
}
