//! Analysis grid definitions.

use serde::{Deserialize, Serialize};

use crate::crs::{AffineTransform, CrsCode};
use crate::error::{FireError, FireResult};
use crate::BoundingBox;

/// Authalic earth radius used for cell areas (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_007.181;

/// Relative tolerance when comparing transform terms.
const TRANSFORM_TOLERANCE: f64 = 1e-9;

/// A raster grid definition: CRS, affine transform and shape.
///
/// Cells are stored row-major starting at pixel (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridDefinition {
    pub crs: CrsCode,
    pub transform: AffineTransform,
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
}

impl GridDefinition {
    /// Create a new grid definition.
    pub fn new(crs: CrsCode, transform: AffineTransform, width: usize, height: usize) -> Self {
        Self {
            crs,
            transform,
            width,
            height,
        }
    }

    /// Reject grids that cannot address any cell.
    pub fn validate(&self) -> FireResult<()> {
        if self.transform.is_degenerate() {
            return Err(FireError::DegenerateTransform(format!(
                "{:?} has zero cell size",
                self.transform.terms()
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(FireError::GridMismatch(format!(
                "grid has empty shape {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nominal cell size in CRS units.
    pub fn nominal_resolution(&self) -> f64 {
        self.transform.nominal_resolution()
    }

    /// Row-major index of a cell.
    pub fn flat_index(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    /// CRS coordinates of a cell centre.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.cell_center(col, row)
    }

    /// Cell containing a CRS coordinate, if it lies on the grid.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.transform.invert(x, y)?;
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col.floor() as usize, row.floor() as usize);
        if col >= self.width || row >= self.height {
            return None;
        }
        Some((col, row))
    }

    /// CRS extent covered by the grid.
    pub fn bbox(&self) -> BoundingBox {
        let w = self.width as f64;
        let h = self.height as f64;
        let corners = [
            self.transform.apply(0.0, 0.0),
            self.transform.apply(w, 0.0),
            self.transform.apply(0.0, h),
            self.transform.apply(w, h),
        ];
        BoundingBox::from_points(corners).unwrap_or_else(BoundingBox::global)
    }

    /// Geographic corner coordinates of a cell: (west, south, east, north).
    ///
    /// Only meaningful for axis-aligned transforms.
    pub fn cell_bounds(&self, col: usize, row: usize) -> BoundingBox {
        let (x0, y0) = self.transform.apply(col as f64, row as f64);
        let (x1, y1) = self.transform.apply(col as f64 + 1.0, row as f64 + 1.0);
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// True surface area of a cell in square meters.
    pub fn cell_area_m2(&self, col: usize, row: usize) -> f64 {
        match self.crs {
            CrsCode::Epsg4326 => {
                let b = self.cell_bounds(col, row);
                let lat0 = b.min_y.clamp(-90.0, 90.0).to_radians();
                let lat1 = b.max_y.clamp(-90.0, 90.0).to_radians();
                EARTH_RADIUS_M * EARTH_RADIUS_M * b.width().to_radians() * (lat1.sin() - lat0.sin()).abs()
            }
            CrsCode::Epsg3857 => {
                let (x, y) = self.cell_center(col, row);
                let (_, lat) = self.crs.to_geographic(x, y);
                let planar = (self.transform.x_scale * self.transform.y_scale
                    - self.transform.x_shear * self.transform.y_shear)
                    .abs();
                planar * lat.to_radians().cos().powi(2)
            }
        }
    }

    /// Cell areas for every cell, row-major.
    pub fn cell_areas(&self) -> Vec<f64> {
        let mut areas = Vec::with_capacity(self.len());
        for row in 0..self.height {
            for col in 0..self.width {
                areas.push(self.cell_area_m2(col, row));
            }
        }
        areas
    }

    /// True when both definitions describe the same cells.
    pub fn matches(&self, other: &GridDefinition) -> bool {
        self.crs == other.crs
            && self.width == other.width
            && self.height == other.height
            && self
                .transform
                .terms()
                .iter()
                .zip(other.transform.terms().iter())
                .all(|(a, b)| (a - b).abs() <= TRANSFORM_TOLERANCE * a.abs().max(b.abs()).max(1.0))
    }

    /// If `self` is an exact integer coarsening of `fine`, return the factor.
    ///
    /// Both grids must share CRS, origin and axis alignment, and `self`'s
    /// cells must be whole multiples of `fine`'s.
    pub fn coarsening_factor_of(&self, fine: &GridDefinition) -> Option<usize> {
        if self.crs != fine.crs || !self.transform.is_axis_aligned() || !fine.transform.is_axis_aligned() {
            return None;
        }
        let (a, b) = (self.transform, fine.transform);
        if (a.x_translation - b.x_translation).abs() > TRANSFORM_TOLERANCE
            || (a.y_translation - b.y_translation).abs() > TRANSFORM_TOLERANCE
            || a.x_scale.signum() != b.x_scale.signum()
            || a.y_scale.signum() != b.y_scale.signum()
        {
            return None;
        }
        let fx = a.x_scale / b.x_scale;
        let fy = a.y_scale / b.y_scale;
        let factor = fx.round();
        if factor < 2.0 || (fx - factor).abs() > 1e-6 || (fy - factor).abs() > 1e-6 {
            return None;
        }
        let factor = factor as usize;
        if fine.width != self.width * factor || fine.height != self.height * factor {
            return None;
        }
        Some(factor)
    }
}

/// Named analysis grids.
pub mod grids {
    use super::*;

    /// Global 0.5 degree geographic grid used by the multi-inventory comparison.
    pub fn geographic_0p5() -> GridDefinition {
        GridDefinition::new(
            CrsCode::Epsg4326,
            AffineTransform::from_terms([0.5, 0.0, -180.0, 0.0, -0.5, 90.0]),
            720,
            360,
        )
    }

    /// Global 0.25 degree geographic grid used by the land-cover model.
    pub fn geographic_0p25() -> GridDefinition {
        GridDefinition::new(
            CrsCode::Epsg4326,
            AffineTransform::from_terms([0.25, 0.0, -180.0, 0.0, -0.25, 90.0]),
            1440,
            720,
        )
    }

    /// Look up a named grid.
    pub fn by_name(name: &str) -> Option<GridDefinition> {
        match name {
            "geographic_0p5" => Some(geographic_0p5()),
            "geographic_0p25" => Some(geographic_0p25()),
            _ => None,
        }
    }
}
