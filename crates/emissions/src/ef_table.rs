//! Emission-factor tables: grams of species per kilogram of dry matter
//! for each GFED land-cover category.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use fire_common::{FireError, FireResult, Species};
use serde::{Deserialize, Serialize};

/// GFED burning categories, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LandCover {
    /// Savanna, grassland and shrubland
    Sava,
    /// Boreal forest
    Borf,
    /// Temperate forest
    Temf,
    /// Tropical deforestation and degradation
    Defo,
    /// Peatland
    Peat,
    /// Agricultural waste burning
    Agri,
}

impl LandCover {
    pub const ALL: [LandCover; 6] = [
        LandCover::Sava,
        LandCover::Borf,
        LandCover::Temf,
        LandCover::Defo,
        LandCover::Peat,
        LandCover::Agri,
    ];

    pub fn abbrev(&self) -> &'static str {
        match self {
            LandCover::Sava => "SAVA",
            LandCover::Borf => "BORF",
            LandCover::Temf => "TEMF",
            LandCover::Defo => "DEFO",
            LandCover::Peat => "PEAT",
            LandCover::Agri => "AGRI",
        }
    }

    /// Band holding this category's share of dry matter.
    pub fn dm_band(&self) -> String {
        format!("DM_{}", self.abbrev())
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for LandCover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// Factors for one species, indexed by [`LandCover::index`].
pub type CategoryFactors = [f64; 6];

/// A named emission-factor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfTable {
    pub name: String,
    #[serde(rename = "factors")]
    rows: BTreeMap<String, CategoryFactors>,
}

impl EfTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    pub fn with_row(mut self, species: impl Into<String>, factors: CategoryFactors) -> Self {
        self.rows.insert(species.into(), factors);
        self
    }

    /// Parse a YAML table:
    ///
    /// ```yaml
    /// name: custom
    /// factors:
    ///   CO: [63, 127, 88, 93, 210, 102]
    /// ```
    pub fn from_yaml(text: &str) -> FireResult<Self> {
        let table: EfTable = serde_yaml::from_str(text)
            .map_err(|e| FireError::Config(format!("invalid emission-factor table: {}", e)))?;
        for (species, factors) in &table.rows {
            if factors.iter().any(|f| !f.is_finite() || *f < 0.0) {
                return Err(FireError::Config(format!(
                    "{}: factors for {} must be non-negative numbers",
                    table.name, species
                )));
            }
        }
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> FireResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FireError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&text)
    }

    fn row(&self, species: &Species) -> Option<&CategoryFactors> {
        let tag = species.tag();
        self.rows.get(tag).or_else(|| {
            self.rows
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(tag))
                .map(|(_, v)| v)
        })
    }

    /// Factors for `species`.
    ///
    /// Exact tag match first, then case-insensitive.
    pub fn factors(&self, species: &Species) -> FireResult<CategoryFactors> {
        self.row(species)
            .copied()
            .ok_or_else(|| FireError::UnsupportedSpecies {
                species: species.tag().to_string(),
                inventory: format!("emission-factor table {}", self.name),
            })
    }

    pub fn contains(&self, species: &Species) -> bool {
        self.row(species).is_some()
    }

    /// Tabulated species in table order.
    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// GFED4 emission factors (Akagi et al. 2011, Andreae and Merlet 2001).
    pub fn gfed4() -> Self {
        let rows: [(&str, CategoryFactors); 41] = [
            ("DM", [1000.0; 6]),
            ("C", [488.273, 464.989, 489.416, 491.751, 570.055, 480.352]),
            ("CO2", [1686.0, 1489.0, 1647.0, 1643.0, 1703.0, 1585.0]),
            ("CO", [63.0, 127.0, 88.0, 93.0, 210.0, 102.0]),
            ("CH4", [1.94, 5.96, 3.36, 5.07, 20.8, 5.82]),
            ("NHMC", [3.4, 8.4, 8.4, 1.7, 1.7, 9.9]),
            ("H2", [1.7, 2.03, 2.03, 3.36, 3.36, 2.59]),
            ("NOx", [3.9, 0.9, 1.92, 2.55, 1.0, 3.11]),
            ("N2O", [0.2, 0.41, 0.16, 0.2, 0.2, 0.1]),
            ("PM2.5", [7.17, 15.3, 12.9, 9.1, 9.1, 6.26]),
            ("TPM", [8.5, 17.6, 17.6, 13.0, 13.0, 12.4]),
            ("TPC", [3.0, 10.1, 10.1, 5.24, 6.06, 3.05]),
            ("OC", [2.62, 9.6, 9.6, 4.71, 6.02, 2.3]),
            ("BC", [0.37, 0.5, 0.5, 0.52, 0.04, 0.75]),
            ("SO2", [0.48, 1.1, 1.1, 0.4, 0.4, 0.4]),
            ("C2H6", [0.66, 1.79, 0.63, 0.71, 0.71, 0.91]),
            ("CH3OH", [1.18, 2.82, 1.74, 2.43, 8.46, 3.29]),
            ("C2H5OH", [0.024, 0.055, 0.1, 0.037, 0.037, 0.035]),
            ("C3H8", [0.1, 0.44, 0.22, 0.126, 0.126, 0.28]),
            ("C2H2", [0.24, 0.18, 0.26, 0.44, 0.06, 0.27]),
            ("C2H4", [0.82, 1.42, 1.17, 1.06, 2.57, 1.46]),
            ("C3H6", [0.79, 1.13, 0.61, 0.64, 3.05, 0.68]),
            ("C5H8", [0.039, 0.15, 0.099, 0.13, 1.38, 0.38]),
            ("C10H16", [0.081, 2.003, 2.003, 0.15, 0.15, 0.005]),
            ("C7H8", [0.08, 0.48, 0.19, 0.26, 1.55, 0.19]),
            ("C6H6", [0.2, 1.11, 0.27, 0.39, 3.19, 0.15]),
            ("C8H10", [0.014, 0.18, 0.13, 0.11, 0.11, 0.114]),
            ("Toluene Lump", [0.270, 1.626, 0.540, 0.697, 4.360, 0.415]),
            ("Higher Alkenes", [0.133, 0.385, 0.369, 0.267, 0.267, 0.333]),
            ("Higher Alkanes", [0.055, 0.349, 0.225, 0.072, 0.072, 0.340]),
            ("CH2O", [0.73, 1.86, 2.09, 1.73, 1.4, 2.08]),
            ("C2H4O", [0.57, 0.77, 0.77, 1.55, 3.27, 1.24]),
            ("C3H6O", [0.16, 0.75, 0.54, 0.63, 1.25, 0.45]),
            ("NH3", [0.52, 2.72, 0.84, 1.33, 1.33, 2.17]),
            ("C2H6S", [0.0013, 0.00465, 0.008, 0.00135, 0.00135, 0.0013]),
            ("HCN", [0.41, 1.52, 0.72, 0.42, 8.11, 0.29]),
            ("HCOOH", [0.21, 0.57, 0.28, 0.79, 0.38, 1.0]),
            ("CH3COOH", [3.55, 4.41, 2.13, 3.05, 8.97, 5.59]),
            ("MEK", [0.181, 0.22, 0.13, 0.5, 0.5, 0.9]),
            ("CH3COCHO", [0.73; 6]),
            ("HOCH2CHO", [0.25, 0.86, 0.86, 0.74, 0.74, 0.71]),
        ];
        Self::from_rows("GFED4", &rows)
    }

    /// Updated factors from Andreae (2019).
    pub fn andreae2019() -> Self {
        let rows: [(&str, CategoryFactors); 27] = [
            ("DM", [1000.0; 6]),
            ("CO2", [1660.0, 1530.0, 1570.0, 1620.0, 1590.0, 1430.0]),
            ("CO", [69.0, 121.0, 113.0, 104.0, 260.0, 76.0]),
            ("CH4", [2.7, 5.5, 5.2, 6.5, 9.1, 5.7]),
            ("H2", [0.97, 1.64, 2.09, 3.09, 1.22, 2.645]),
            ("NOx", [2.49, 1.18, 3.02, 2.81, 1.24, 2.4]),
            ("N2O", [0.17, 0.24, 0.25, 0.2, 0.2, 0.09]),
            ("PM2.5", [6.7, 18.7, 18.5, 8.3, 18.9, 8.2]),
            ("TPM", [8.7, 15.3, 18.4, 10.9, 27.5, 12.9]),
            ("TPC", [3.2, 9.8, 8.4, 5.5, 14.3, 5.3]),
            ("OC", [3.0, 5.9, 10.9, 4.4, 14.2, 4.9]),
            ("BC", [0.53, 0.43, 0.55, 0.51, 0.1, 0.42]),
            ("SO2", [0.47, 0.75, 0.7, 0.77, 4.26, 0.8]),
            ("C2H6", [0.417, 1.79, 0.63, 0.71, 0.71, 0.91]),
            ("CH3OH", [1.348, 2.332, 2.186, 2.796, 2.543, 3.27]),
            ("C2H5OH", [0.036, 0.058, 0.076, 0.067, 0.17, 0.05]),
            ("C3H8", [0.134, 0.295, 0.276, 0.534, 0.99, 0.167]),
            ("C2H2", [0.313, 0.283, 0.311, 0.353, 0.111, 0.272]),
            ("C2H4", [0.832, 1.539, 1.113, 1.106, 1.474, 0.995]),
            ("C3H6", [0.462, 0.674, 0.599, 0.863, 1.14, 0.472]),
            ("C5H8", [0.101, 0.074, 0.095, 0.218, 0.518, 0.175]),
            ("C7H8", [0.191, 0.353, 0.273, 0.234, 0.445, 0.168]),
            ("CH2O", [1.228, 1.746, 2.044, 2.400, 1.072, 1.806]),
            ("NH3", [0.89, 2.46, 0.98, 1.33, 4.15, 0.99]),
            ("C2H6S", [0.0084, 0.002, 0.014, 0.002, 0.045, 0.05]),
            ("HCN", [0.44, 0.53, 0.64, 0.44, 4.40, 0.42]),
            ("CH3COOH", [0.395, 0.57, 0.2, 0.49, 0.229, 0.554]),
        ];
        Self::from_rows("Andreae2019", &rows)
    }

    fn from_rows(name: &str, rows: &[(&str, CategoryFactors)]) -> Self {
        rows.iter()
            .fold(Self::new(name), |table, (species, factors)| {
                table.with_row(*species, *factors)
            })
    }
}
