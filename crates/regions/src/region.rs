//! Region selections and their parsing from selector strings.

use std::fmt;
use std::str::FromStr;

use fire_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::basis::BasisRegion;
use crate::error::{RegionError, Result};
use crate::geometry::Position;

/// A user-facing region selection.
///
/// Selector syntax (see [`Region::from_str`]):
///
/// | Selector | Region |
/// |----------|--------|
/// | `global` | [`Region::Global`] |
/// | `basis:EQAS`, `basis:4` | [`Region::Basis`] |
/// | `country:Bahamas` | [`Region::Country`] |
/// | `point:111.3,-2.8` | [`Region::Point`] |
/// | `polygon:100,0;101,0;101,1` | [`Region::Polygon`] |
/// | `bbox:100,-5,120,5` | [`Region::Polygon`] tracing the box |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Region {
    Basis { id: u8 },
    Country { name: String },
    Point { lon: f64, lat: f64 },
    Polygon { ring: Vec<Position> },
    Global,
}

impl Region {
    /// Basis region by id, abbreviation or display label.
    pub fn basis(key: &str) -> Result<Self> {
        Ok(Region::Basis {
            id: BasisRegion::lookup(key)?.id,
        })
    }

    pub fn country(name: impl Into<String>) -> Self {
        Region::Country { name: name.into() }
    }

    /// Short human-readable description.
    pub fn describe(&self) -> String {
        match self {
            Region::Basis { id } => match BasisRegion::by_id(*id) {
                Some(r) => r.label(),
                None => format!("basis {}", id),
            },
            Region::Country { name } => name.clone(),
            Region::Point { lon, lat } => point_name(*lon, *lat),
            Region::Polygon { ring } => format!("custom polygon ({} vertices)", ring.len()),
            Region::Global => "Global".to_string(),
        }
    }
}

impl FromStr for Region {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("global") {
            return Ok(Region::Global);
        }

        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| RegionError::parse(format!("expected '<kind>:<value>', got '{}'", s)))?;
        let value = value.trim();

        match kind.trim().to_ascii_lowercase().as_str() {
            "basis" => Region::basis(value),
            "country" => {
                if value.is_empty() {
                    return Err(RegionError::parse("empty country name"));
                }
                Ok(Region::country(value))
            }
            "point" => {
                let [lon, lat] = parse_position(value)?;
                Ok(Region::Point { lon, lat })
            }
            "polygon" => {
                let ring = value
                    .split(';')
                    .filter(|p| !p.trim().is_empty())
                    .map(parse_position)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Region::Polygon { ring })
            }
            "bbox" => {
                let bbox = BoundingBox::parse(value)
                    .map_err(|e| RegionError::parse(format!("bbox: {}", e)))?;
                Ok(Region::Polygon {
                    ring: bbox.to_ring().into_iter().map(|(x, y)| [x, y]).collect(),
                })
            }
            other => Err(RegionError::parse(format!("unknown region kind '{}'", other))),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

fn parse_position(s: &str) -> Result<Position> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(RegionError::parse(format!("expected 'lon,lat', got '{}'", s)));
    }
    let lon = parts[0]
        .parse::<f64>()
        .map_err(|_| RegionError::parse(format!("invalid longitude '{}'", parts[0])))?;
    let lat = parts[1]
        .parse::<f64>()
        .map_err(|_| RegionError::parse(format!("invalid latitude '{}'", parts[1])))?;
    Ok([lon, lat])
}

/// Name of a point region, e.g. `111.3E_2.8S`.
pub fn point_name(lon: f64, lat: f64) -> String {
    let ew = if lon < 0.0 { 'W' } else { 'E' };
    let ns = if lat < 0.0 { 'S' } else { 'N' };
    format!("{:.1}{}_{:.1}{}", lon.abs(), ew, lat.abs(), ns)
}

/// Make a region name safe for export file names.
///
/// Spaces, `&` and `-` become `_`; apostrophes are removed.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '\'')
        .map(|c| match c {
            ' ' | '&' | '-' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selectors() {
        assert_eq!("global".parse::<Region>().unwrap(), Region::Global);
        assert_eq!("basis:EQAS".parse::<Region>().unwrap(), Region::Basis { id: 4 });
        assert_eq!("basis:4".parse::<Region>().unwrap(), Region::Basis { id: 4 });
        assert_eq!(
            "country:Bahamas".parse::<Region>().unwrap(),
            Region::country("Bahamas")
        );
        assert_eq!(
            "point:111.3, -2.8".parse::<Region>().unwrap(),
            Region::Point {
                lon: 111.3,
                lat: -2.8
            }
        );
        match "polygon:100,0;101,0;101,1".parse::<Region>().unwrap() {
            Region::Polygon { ring } => assert_eq!(ring.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
        match "bbox:100,-5,120,5".parse::<Region>().unwrap() {
            Region::Polygon { ring } => {
                assert_eq!(ring.len(), 5);
                assert_eq!(ring[0], [100.0, -5.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!("EQAS".parse::<Region>().is_err());
        assert!("basis:XXXX".parse::<Region>().is_err());
        assert!("point:1".parse::<Region>().is_err());
        assert!("point:a,b".parse::<Region>().is_err());
        assert!("country:".parse::<Region>().is_err());
        assert!("ocean:pacific".parse::<Region>().is_err());
    }

    #[test]
    fn test_point_name() {
        assert_eq!(point_name(111.3, -2.8), "111.3E_2.8S");
        assert_eq!(point_name(-60.04, 10.0), "60.0W_10.0N");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Bahamas, The"), "Bahamas,_The");
        assert_eq!(sanitize_name("Cote d'Ivoire"), "Cote_dIvoire");
        assert_eq!(sanitize_name("Trinidad & Tobago"), "Trinidad___Tobago");
        assert_eq!(sanitize_name("Guinea-Bissau"), "Guinea_Bissau");
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_value(Region::Basis { id: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "basis", "id": 4}));
        let back: Region = serde_json::from_value(serde_json::json!({"type": "global"})).unwrap();
        assert_eq!(back, Region::Global);
    }
}
