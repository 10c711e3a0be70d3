//! The five global fire-emission inventories.

use std::fmt;
use std::str::FromStr;

use fire_common::{FireError, Species, YearRange};
use serde::{Deserialize, Serialize};

/// Suffix carried by every native band of the 0.5° inventories.
pub const NATIVE_BAND_SUFFIX: &str = "_0-5deg";

/// One independently produced emission inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Inventory {
    #[serde(rename = "GFEDv4s")]
    Gfed4s,
    #[serde(rename = "FINNv1p5")]
    Finn15,
    #[serde(rename = "GFASv1p2")]
    Gfas12,
    #[serde(rename = "QFEDv2p5r1")]
    Qfed25,
    #[serde(rename = "FEERv1p0_G1p2")]
    Feer10,
}

/// Years a source covers. Years after `final_year` are preliminary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub first_year: i32,
    pub last_year: i32,
    pub final_year: i32,
}

impl Coverage {
    pub fn new(first_year: i32, last_year: i32, final_year: i32) -> Self {
        Self {
            first_year,
            last_year,
            final_year,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.first_year && year <= self.last_year
    }

    pub fn is_preliminary(&self, year: i32) -> bool {
        year > self.final_year
    }

    /// Part of `years` inside the coverage, if any.
    pub fn clip(&self, years: &YearRange) -> Option<YearRange> {
        YearRange::new(self.first_year, self.last_year)
            .ok()
            .and_then(|own| own.intersect(years))
    }
}

const FINN_BANDS: [&str; 7] = ["BA", "CO", "CO2", "CH4", "OC", "BC", "PM2/5"];
const GFAS_BANDS: [&str; 8] = ["APT", "FRP", "CO", "CO2", "CH4", "OC", "BC", "PM2/5"];
const SPECIES_BANDS: [&str; 6] = ["CO", "CO2", "CH4", "OC", "BC", "PM2/5"];

impl Inventory {
    /// All inventories in column order.
    pub const ALL: [Inventory; 5] = [
        Inventory::Gfed4s,
        Inventory::Finn15,
        Inventory::Gfas12,
        Inventory::Qfed25,
        Inventory::Feer10,
    ];

    /// Stable identifier used for storage paths and band names.
    pub fn id(&self) -> &'static str {
        match self {
            Inventory::Gfed4s => "GFEDv4s",
            Inventory::Finn15 => "FINNv1p5",
            Inventory::Gfas12 => "GFASv1p2",
            Inventory::Qfed25 => "QFEDv2p5r1",
            Inventory::Feer10 => "FEERv1p0_G1p2",
        }
    }

    /// Label used in tables and charts.
    pub fn label(&self) -> &'static str {
        match self {
            Inventory::Gfed4s => "GFEDv4s",
            Inventory::Finn15 => "FINNv1.5",
            Inventory::Gfas12 => "GFASv1.2",
            Inventory::Qfed25 => "QFEDv2.5r1",
            Inventory::Feer10 => "FEERv1.0-G1.2",
        }
    }

    /// True for the dry-matter inventory that goes through emission factors.
    pub fn uses_emission_factors(&self) -> bool {
        matches!(self, Inventory::Gfed4s)
    }

    /// Native species band names, without the resolution suffix.
    ///
    /// Empty for GFEDv4s, whose species are derived from dry matter.
    pub fn native_bands(&self) -> &'static [&'static str] {
        match self {
            Inventory::Gfed4s => &[],
            Inventory::Finn15 => &FINN_BANDS,
            Inventory::Gfas12 => &GFAS_BANDS,
            Inventory::Qfed25 | Inventory::Feer10 => &SPECIES_BANDS,
        }
    }

    /// Stored band holding a species, e.g. `PM2/5_0-5deg`.
    pub fn native_band(&self, species: &Species) -> Option<String> {
        let stem = species.tag().replace('.', "/");
        self.native_bands()
            .iter()
            .find(|b| b.eq_ignore_ascii_case(&stem))
            .map(|b| format!("{}{}", b, NATIVE_BAND_SUFFIX))
    }

    /// Coverage of the published datasets.
    pub fn default_coverage(&self) -> Coverage {
        match self {
            Inventory::Gfed4s => Coverage::new(1997, 2019, 2016),
            _ => Coverage::new(2003, 2016, 2016),
        }
    }

    /// Name of the grid the inventory is distributed on.
    pub fn default_grid_name(&self) -> &'static str {
        match self {
            Inventory::Gfed4s => "geographic_0p25",
            _ => "geographic_0p5",
        }
    }
}

impl FromStr for Inventory {
    type Err = FireError;

    /// Accepts the id or the label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Inventory::ALL
            .into_iter()
            .find(|inv| inv.id().eq_ignore_ascii_case(s) || inv.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| FireError::InvalidParameter {
                param: "inventory".to_string(),
                message: format!("unknown inventory '{}'", s),
            })
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
