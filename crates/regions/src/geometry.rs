//! GeoJSON-style footprint geometries in geographic coordinates.
//!
//! Positions are `[lon, lat]` in degrees. Rings are closed (first position
//! repeated at the end) and polygons carry one exterior ring followed by
//! zero or more holes.

use fire_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::{RegionError, Result};

/// A `[lon, lat]` position.
pub type Position = [f64; 2];

/// Footprint geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl Geometry {
    /// A single point, rejected if outside geographic bounds.
    pub fn point(lon: f64, lat: f64) -> Result<Self> {
        check_position(&[lon, lat])?;
        Ok(Geometry::Point {
            coordinates: [lon, lat],
        })
    }

    /// A polygon from one exterior ring.
    ///
    /// An open ring is closed by repeating its first position. The ring
    /// must not cross itself; collapsed rings are kept with zero area.
    pub fn polygon(mut ring: Vec<Position>) -> Result<Self> {
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        validate_ring(&ring)?;
        Ok(Geometry::Polygon {
            coordinates: vec![ring],
        })
    }

    /// Rectangle covering a bounding box.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        let ring = bbox.to_ring().into_iter().map(|(x, y)| [x, y]).collect();
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point { .. })
    }

    /// Polygons of this geometry (none for a point).
    pub fn polygons(&self) -> Vec<&[Vec<Position>]> {
        match self {
            Geometry::Point { .. } => Vec::new(),
            Geometry::Polygon { coordinates } => vec![coordinates.as_slice()],
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().map(|p| p.as_slice()).collect()
            }
        }
    }

    /// Merge two geometries into one multi-polygon. Points are dropped.
    pub fn merge(self, other: Geometry) -> Geometry {
        let mut polygons = self.into_polygons();
        polygons.extend(other.into_polygons());
        Geometry::MultiPolygon {
            coordinates: polygons,
        }
    }

    fn into_polygons(self) -> Vec<Vec<Vec<Position>>> {
        match self {
            Geometry::Point { .. } => Vec::new(),
            Geometry::Polygon { coordinates } => vec![coordinates],
            Geometry::MultiPolygon { coordinates } => coordinates,
        }
    }

    /// Bounding box of all positions.
    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Geometry::Point { coordinates } => {
                BoundingBox::from_points(std::iter::once((coordinates[0], coordinates[1])))
            }
            _ => BoundingBox::from_points(
                self.polygons()
                    .into_iter()
                    .flat_map(|rings| rings.iter().take(1))
                    .flat_map(|ring| ring.iter().map(|p| (p[0], p[1]))),
            ),
        }
    }

    /// Whether a position lies inside the geometry.
    ///
    /// A point geometry contains only its own position. Positions inside a
    /// hole are outside the polygon.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        match self {
            Geometry::Point { coordinates } => coordinates[0] == lon && coordinates[1] == lat,
            _ => self
                .polygons()
                .into_iter()
                .any(|rings| polygon_contains(rings, lon, lat)),
        }
    }

    /// Planar area in square degrees (holes subtracted).
    pub fn area(&self) -> f64 {
        self.polygons()
            .into_iter()
            .map(|rings| {
                let mut iter = rings.iter();
                let exterior = iter.next().map(|r| ring_area(r)).unwrap_or(0.0);
                exterior - iter.map(|r| ring_area(r)).sum::<f64>()
            })
            .sum()
    }

    /// Validate every ring (or the point position).
    pub fn validate(&self) -> Result<()> {
        match self {
            Geometry::Point { coordinates } => check_position(coordinates),
            _ => {
                let polygons = self.polygons();
                if polygons.is_empty() {
                    return Err(RegionError::invalid_geometry("geometry has no polygons"));
                }
                for rings in polygons {
                    if rings.is_empty() {
                        return Err(RegionError::invalid_geometry("polygon has no rings"));
                    }
                    for ring in rings {
                        validate_ring(ring)?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_position(p: &Position) -> Result<()> {
    let [lon, lat] = *p;
    if !lon.is_finite() || !lat.is_finite() {
        return Err(RegionError::invalid_geometry(format!(
            "non-finite coordinate ({}, {})",
            lon, lat
        )));
    }
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(RegionError::invalid_geometry(format!(
            "coordinate ({}, {}) outside geographic bounds",
            lon, lat
        )));
    }
    Ok(())
}

/// Check that a ring is closed and simple.
///
/// Only proper crossings between non-adjacent edges count as
/// self-intersection. Collapsed rings (fewer than 4 positions or fewer
/// than 3 distinct vertices) are degenerate but valid and cover no cells.
pub fn validate_ring(ring: &[Position]) -> Result<()> {
    if ring.is_empty() {
        return Err(RegionError::invalid_geometry("ring has no positions"));
    }
    for p in ring {
        check_position(p)?;
    }
    if ring.first() != ring.last() {
        return Err(RegionError::invalid_geometry("ring is not closed"));
    }
    if ring.len() < 4 {
        return Ok(());
    }

    let edges = ring.len() - 1;
    for i in 0..edges {
        for j in (i + 2)..edges {
            // first and last edges share the closing vertex
            if i == 0 && j == edges - 1 {
                continue;
            }
            if segments_cross(ring[i], ring[i + 1], ring[j], ring[j + 1]) {
                return Err(RegionError::invalid_geometry(format!(
                    "ring self-intersects between edges {} and {}",
                    i, j
                )));
            }
        }
    }
    Ok(())
}

fn orientation(a: Position, b: Position, c: Position) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn segments_cross(a: Position, b: Position, c: Position, d: Position) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);
    o1 * o2 < 0.0 && o3 * o4 < 0.0
}

/// Ray-casting point-in-ring test.
pub fn ring_contains(ring: &[Position], lon: f64, lat: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn polygon_contains(rings: &[Vec<Position>], lon: f64, lat: f64) -> bool {
    match rings.split_first() {
        Some((exterior, holes)) => {
            ring_contains(exterior, lon, lat)
                && !holes.iter().any(|hole| ring_contains(hole, lon, lat))
        }
        None => false,
    }
}

fn ring_area(ring: &[Position]) -> f64 {
    let twice: f64 = ring
        .windows(2)
        .map(|w| w[0][0] * w[1][1] - w[1][0] * w[0][1])
        .sum();
    twice.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Position> {
        vec![
            [x0, y0],
            [x0 + size, y0],
            [x0 + size, y0 + size],
            [x0, y0 + size],
            [x0, y0],
        ]
    }

    #[test]
    fn test_polygon_contains() {
        let poly = Geometry::polygon(square(0.0, 0.0, 10.0)).unwrap();
        assert!(poly.contains(5.0, 5.0));
        assert!(!poly.contains(15.0, 5.0));
        assert!(!poly.contains(-1.0, -1.0));
    }

    #[test]
    fn test_hole_excluded() {
        let poly = Geometry::Polygon {
            coordinates: vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)],
        };
        assert!(poly.contains(1.0, 1.0));
        assert!(!poly.contains(5.0, 5.0));
        assert!((poly.area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_ring_is_closed() {
        let ring = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        let poly = Geometry::polygon(ring).unwrap();
        let rings = poly.polygons();
        assert_eq!(rings[0][0].len(), 4);
        assert!((poly.area() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bow_tie_rejected() {
        let ring = vec![[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]];
        let err = Geometry::polygon(ring).unwrap_err();
        assert!(matches!(err, RegionError::InvalidGeometry(_)));
    }

    #[test]
    fn test_empty_ring_rejected() {
        assert!(Geometry::polygon(Vec::new()).is_err());
    }

    #[test]
    fn test_short_closed_ring_is_degenerate() {
        let poly = Geometry::polygon(vec![[100.0, 1.0], [110.0, 1.0], [100.0, 1.0]]).unwrap();
        assert_eq!(poly.polygons()[0][0].len(), 3);
        assert_eq!(poly.area(), 0.0);
        assert!(!poly.contains(105.0, 1.0));

        let segment = Geometry::polygon(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap();
        assert_eq!(segment.area(), 0.0);
        let single = Geometry::polygon(vec![[5.0, 5.0]]).unwrap();
        assert!(single.validate().is_ok());
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        assert!(Geometry::point(181.0, 0.0).is_err());
        assert!(Geometry::point(0.0, f64::NAN).is_err());
        assert!(Geometry::polygon(square(170.0, 0.0, 20.0)).is_err());
    }

    #[test]
    fn test_collapsed_ring_has_zero_area() {
        let ring = vec![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [1.0, 1.0]];
        let poly = Geometry::polygon(ring).unwrap();
        assert_eq!(poly.area(), 0.0);
        assert!(!poly.contains(2.0, 2.0));
    }

    #[test]
    fn test_merge_and_bbox() {
        let a = Geometry::polygon(square(0.0, 0.0, 1.0)).unwrap();
        let b = Geometry::polygon(square(10.0, -5.0, 1.0)).unwrap();
        let merged = a.merge(b);
        assert_eq!(merged.polygons().len(), 2);
        assert!(merged.contains(10.5, -4.5));
        assert_eq!(merged.bbox(), Some(BoundingBox::new(0.0, -5.0, 11.0, 1.0)));
    }

    #[test]
    fn test_geojson_shape() {
        let json = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#;
        let geom: Geometry = serde_json::from_str(json).unwrap();
        assert!(geom.validate().is_ok());
        assert!(geom.contains(0.9, 0.1));
    }
}
