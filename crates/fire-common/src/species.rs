//! Canonical species tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FireError;

/// A requested emission species or burned-area product.
///
/// The six multi-inventory species get their own variants; anything else
/// tabulated by an emission-factor table is carried as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Species {
    Co,
    Co2,
    Ch4,
    Oc,
    Bc,
    Pm25,
    /// Burned area, handled without emission factors
    BurnedArea,
    /// Dry matter or another emission-factor-table species
    Other(String),
}

/// Display unit for map and export consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayUnit {
    pub label: &'static str,
    /// Multiplier from teragrams to the display unit
    pub from_tg: f64,
}

impl Species {
    /// Species reported by every inventory, in column order.
    pub const MULTI_INVENTORY: [Species; 6] = [
        Species::Co,
        Species::Co2,
        Species::Ch4,
        Species::Oc,
        Species::Bc,
        Species::Pm25,
    ];

    /// Canonical tag, e.g. "CO2" or "PM2.5".
    pub fn tag(&self) -> &str {
        match self {
            Species::Co => "CO",
            Species::Co2 => "CO2",
            Species::Ch4 => "CH4",
            Species::Oc => "OC",
            Species::Bc => "BC",
            Species::Pm25 => "PM2.5",
            Species::BurnedArea => "BA",
            Species::Other(tag) => tag,
        }
    }

    /// Tag without punctuation, usable as a band or file name.
    pub fn band_name(&self) -> String {
        self.tag().replace(['.', '/'], "")
    }

    /// True for the burned-area product.
    pub fn is_burned_area(&self) -> bool {
        matches!(self, Species::BurnedArea)
    }

    /// True for species present in every inventory.
    pub fn is_multi_inventory(&self) -> bool {
        Species::MULTI_INVENTORY.contains(self)
    }

    /// Unit used when mapping a multi-inventory species.
    pub fn display_unit(&self) -> DisplayUnit {
        match self {
            Species::Co | Species::Co2 => DisplayUnit {
                label: "Gg",
                from_tg: 1e3,
            },
            Species::Ch4 | Species::Oc | Species::Bc | Species::Pm25 => DisplayUnit {
                label: "Mg",
                from_tg: 1e6,
            },
            Species::BurnedArea => DisplayUnit {
                label: "thousand km2",
                from_tg: 1.0,
            },
            Species::Other(_) => DisplayUnit {
                label: "Tg",
                from_tg: 1.0,
            },
        }
    }
}

impl FromStr for Species {
    type Err = FireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FireError::UnknownSpecies(s.to_string()));
        }
        let species = match trimmed.to_uppercase().as_str() {
            "CO" => Species::Co,
            "CO2" => Species::Co2,
            "CH4" => Species::Ch4,
            "OC" => Species::Oc,
            "BC" => Species::Bc,
            "PM2.5" | "PM25" | "PM2/5" => Species::Pm25,
            "BA" => Species::BurnedArea,
            _ => Species::Other(trimmed.to_string()),
        };
        Ok(species)
    }
}

impl TryFrom<String> for Species {
    type Error = FireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Species> for String {
    fn from(value: Species) -> Self {
        value.tag().to_string()
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("pm25".parse::<Species>().unwrap(), Species::Pm25);
        assert_eq!("PM2/5".parse::<Species>().unwrap(), Species::Pm25);
        assert_eq!("ba".parse::<Species>().unwrap(), Species::BurnedArea);
        assert_eq!(
            "NMHC".parse::<Species>().unwrap(),
            Species::Other("NMHC".to_string())
        );
        assert!("  ".parse::<Species>().is_err());
    }

    #[test]
    fn test_tags() {
        assert_eq!(Species::Pm25.tag(), "PM2.5");
        assert_eq!(Species::Pm25.band_name(), "PM25");
        assert_eq!(Species::Co2.to_string(), "CO2");
    }

    #[test]
    fn test_display_units() {
        assert_eq!(Species::Co2.display_unit().label, "Gg");
        assert_eq!(Species::Bc.display_unit().from_tg, 1e6);
    }
}
