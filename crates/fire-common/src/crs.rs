//! Coordinate reference systems and affine pixel transforms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Earth radius used by the spherical Web Mercator projection (meters).
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of Web Mercator.
const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Well-known CRS codes understood by the raster engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    #[serde(rename = "EPSG:4326")]
    Epsg4326,
    /// Web Mercator (meters)
    #[serde(rename = "EPSG:3857")]
    Epsg3857,
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// Convert a lon/lat position into this CRS.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            CrsCode::Epsg4326 => (lon, lat),
            CrsCode::Epsg3857 => {
                let lat = lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
                let x = WEB_MERCATOR_RADIUS * lon.to_radians();
                let y = WEB_MERCATOR_RADIUS
                    * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                (x, y)
            }
        }
    }

    /// Convert a position in this CRS to lon/lat.
    pub fn to_geographic(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            CrsCode::Epsg4326 => (x, y),
            CrsCode::Epsg3857 => {
                let lon = (x / WEB_MERCATOR_RADIUS).to_degrees();
                let lat = (2.0 * (y / WEB_MERCATOR_RADIUS).exp().atan()
                    - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                (lon, lat)
            }
        }
    }

    /// Re-express a position from `self` into `target`.
    pub fn transform_point(&self, target: CrsCode, x: f64, y: f64) -> (f64, f64) {
        if *self == target {
            return (x, y);
        }
        let (lon, lat) = self.to_geographic(x, y);
        target.from_geographic(lon, lat)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

/// Six-term affine transform mapping pixel (col, row) to CRS (x, y).
///
/// Terms follow the `crsTransform` order
/// `[x_scale, x_shear, x_translation, y_shear, y_scale, y_translation]`:
///
/// ```text
/// x = x_scale * col + x_shear * row + x_translation
/// y = y_shear * col + y_scale * row + y_translation
/// ```
///
/// Pixel coordinates refer to the upper-left corner of a cell, so the
/// centre of cell (c, r) is at pixel (c + 0.5, r + 0.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub x_scale: f64,
    pub x_shear: f64,
    pub x_translation: f64,
    pub y_shear: f64,
    pub y_scale: f64,
    pub y_translation: f64,
}

impl AffineTransform {
    /// Build from the six `crsTransform` terms.
    pub fn from_terms(terms: [f64; 6]) -> Self {
        Self {
            x_scale: terms[0],
            x_shear: terms[1],
            x_translation: terms[2],
            y_shear: terms[3],
            y_scale: terms[4],
            y_translation: terms[5],
        }
    }

    /// North-up transform with square-ish cells anchored at the upper-left corner.
    pub fn north_up(origin_x: f64, origin_y: f64, cell_width: f64, cell_height: f64) -> Self {
        Self::from_terms([cell_width, 0.0, origin_x, 0.0, -cell_height, origin_y])
    }

    /// The six terms in `crsTransform` order.
    pub fn terms(&self) -> [f64; 6] {
        [
            self.x_scale,
            self.x_shear,
            self.x_translation,
            self.y_shear,
            self.y_scale,
            self.y_translation,
        ]
    }

    fn determinant(&self) -> f64 {
        self.x_scale * self.y_scale - self.x_shear * self.y_shear
    }

    /// True when the transform collapses cells to zero area.
    pub fn is_degenerate(&self) -> bool {
        let det = self.determinant();
        !det.is_finite() || det.abs() < f64::EPSILON
    }

    /// True when rows and columns are aligned with the CRS axes.
    pub fn is_axis_aligned(&self) -> bool {
        self.x_shear == 0.0 && self.y_shear == 0.0
    }

    /// Map a (fractional) pixel position to CRS coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.x_scale * col + self.x_shear * row + self.x_translation,
            self.y_shear * col + self.y_scale * row + self.y_translation,
        )
    }

    /// CRS coordinates of the centre of cell (col, row).
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Map CRS coordinates back to a fractional pixel position.
    ///
    /// Returns None for degenerate transforms.
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.determinant();
        if self.is_degenerate() {
            return None;
        }
        let dx = x - self.x_translation;
        let dy = y - self.y_translation;
        let col = (self.y_scale * dx - self.x_shear * dy) / det;
        let row = (-self.y_shear * dx + self.x_scale * dy) / det;
        Some((col, row))
    }

    /// Nominal cell size: the geometric mean of the absolute pixel extents.
    pub fn nominal_resolution(&self) -> f64 {
        self.determinant().abs().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("epsg:4326").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("EPSG:900913").unwrap(), CrsCode::Epsg3857);
        assert!(CrsCode::parse("EPSG:5070").is_err());
    }

    #[test]
    fn test_web_mercator_round_trip() {
        let (x, y) = CrsCode::Epsg3857.from_geographic(111.25, -2.75);
        let (lon, lat) = CrsCode::Epsg3857.to_geographic(x, y);
        assert!((lon - 111.25).abs() < 1e-9);
        assert!((lat + 2.75).abs() < 1e-9);
    }

    #[test]
    fn test_half_degree_transform() {
        let t = AffineTransform::from_terms([0.5, 0.0, -180.0, 0.0, -0.5, 90.0]);
        assert_eq!(t.cell_center(0, 0), (-179.75, 89.75));
        assert_eq!(t.cell_center(719, 359), (179.75, -89.75));

        let (col, row) = t.invert(0.1, 0.1).unwrap();
        assert!((col - 360.2).abs() < 1e-9);
        assert!((row - 179.8).abs() < 1e-9);
        assert!((t.nominal_resolution() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_transform() {
        let t = AffineTransform::from_terms([0.0, 0.0, -180.0, 0.0, -0.5, 90.0]);
        assert!(t.is_degenerate());
        assert!(t.invert(0.0, 0.0).is_none());
    }

    #[test]
    fn test_rotated_transform_inverts() {
        let t = AffineTransform::from_terms([0.5, 0.1, 10.0, 0.2, -0.5, 50.0]);
        let (x, y) = t.apply(3.25, 7.5);
        let (col, row) = t.invert(x, y).unwrap();
        assert!((col - 3.25).abs() < 1e-9);
        assert!((row - 7.5).abs() < 1e-9);
        assert!(!t.is_axis_aligned());
    }
}
