//! Pipeline configuration.
//!
//! Loaded from YAML, with environment overrides for the directories and
//! the cache size:
//!
//! ```yaml
//! data_dir: /data/firecam
//! reference_dir: /data/firecam/reference
//! comparison_grid: geographic_0p5
//! cache_capacity: 32
//! inventories:
//!   GFEDv4s:
//!     grid: geographic_0p25
//!     coverage: { first_year: 1997, last_year: 2019, final_year: 2016 }
//!     scale_divisor: 1.0
//!     daily_first_year: 2003
//! reducer:
//!   statistic: sum
//!   weighting: unweighted
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fire_common::grid::grids;
use fire_common::{AffineTransform, CrsCode, FireError, FireResult, GridDefinition};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inventory::{Coverage, Inventory};
use crate::reduce::{Statistic, Weighting};

/// A named analysis grid or an explicit definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridSpec {
    Named(String),
    Custom {
        crs: CrsCode,
        transform: [f64; 6],
        width: usize,
        height: usize,
    },
}

impl GridSpec {
    pub fn named(name: impl Into<String>) -> Self {
        GridSpec::Named(name.into())
    }

    pub fn custom(grid: &GridDefinition) -> Self {
        GridSpec::Custom {
            crs: grid.crs,
            transform: grid.transform.terms(),
            width: grid.width,
            height: grid.height,
        }
    }

    /// The grid definition, validated.
    pub fn resolve(&self) -> FireResult<GridDefinition> {
        let grid = match self {
            GridSpec::Named(name) => grids::by_name(name)
                .ok_or_else(|| FireError::Config(format!("unknown analysis grid '{}'", name)))?,
            GridSpec::Custom {
                crs,
                transform,
                width,
                height,
            } => GridDefinition::new(*crs, AffineTransform::from_terms(*transform), *width, *height),
        };
        grid.validate()?;
        Ok(grid)
    }
}

/// Per-inventory settings.
///
/// Fields left out of a YAML entry take the inventory's published
/// defaults (see [`EmissionsConfig::settings`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Grid the adapter resamples onto when the inventory is used alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Coverage>,
    /// Stored mass values are divided by this to recover physical units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_divisor: Option<f64>,
    /// First year with day-of-month fractions, if the source has them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_first_year: Option<i32>,
}

/// Divisor of the band-per-species inventories.
const STORED_SCALE: f64 = 1e9;

impl InventorySettings {
    /// Settings matching the published datasets.
    pub fn default_for(inventory: Inventory) -> Self {
        Self {
            grid: Some(GridSpec::named(inventory.default_grid_name())),
            coverage: Some(inventory.default_coverage()),
            // dry matter is stored unscaled
            scale_divisor: Some(if inventory.uses_emission_factors() {
                1.0
            } else {
                STORED_SCALE
            }),
            daily_first_year: inventory.uses_emission_factors().then_some(2003),
        }
    }

    /// Fill every field left unset from the inventory's defaults.
    pub fn or_defaults(self, inventory: Inventory) -> Self {
        let defaults = Self::default_for(inventory);
        Self {
            grid: self.grid.or(defaults.grid),
            coverage: self.coverage.or(defaults.coverage),
            scale_divisor: self.scale_divisor.or(defaults.scale_divisor),
            daily_first_year: self.daily_first_year.or(defaults.daily_first_year),
        }
    }

    /// Analysis grid of the inventory.
    pub fn grid(&self) -> FireResult<GridDefinition> {
        self.grid
            .as_ref()
            .ok_or_else(|| FireError::Config("inventory grid not set".to_string()))?
            .resolve()
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage.unwrap_or_else(|| Coverage::new(i32::MAX, i32::MIN, i32::MIN))
    }

    pub fn divisor(&self) -> f64 {
        self.scale_divisor.unwrap_or(1.0)
    }
}

/// Default regional statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerSettings {
    pub statistic: Statistic,
    pub weighting: Weighting,
    /// Sub-cell samples per axis when estimating partial cell coverage.
    pub coverage_samples: usize,
}

impl Default for ReducerSettings {
    fn default() -> Self {
        Self {
            statistic: Statistic::Sum,
            weighting: Weighting::Unweighted,
            coverage_samples: 4,
        }
    }
}

/// Configuration for [`crate::EmissionsPipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionsConfig {
    /// Root of the per-inventory Zarr collections.
    pub data_dir: PathBuf,
    /// Boundary datasets, alias table and emission-factor overrides.
    pub reference_dir: PathBuf,
    /// Common grid for multi-inventory comparisons.
    pub comparison_grid: GridSpec,
    pub inventories: BTreeMap<Inventory, InventorySettings>,
    pub reducer: ReducerSettings,
    /// Entries in the series cache; 0 disables caching.
    pub cache_capacity: usize,
    /// Last year covered by the land-cover product.
    pub land_cover_last_year: i32,
    /// YAML table replacing the built-in GFED4 emission factors.
    pub ef_table: Option<PathBuf>,
    /// YAML table replacing the built-in Andreae (2019) emission factors.
    pub alternative_ef_table: Option<PathBuf>,
}

impl Default for EmissionsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            reference_dir: PathBuf::from("reference"),
            comparison_grid: GridSpec::named("geographic_0p5"),
            inventories: Inventory::ALL
                .into_iter()
                .map(|inv| (inv, InventorySettings::default_for(inv)))
                .collect(),
            reducer: ReducerSettings::default(),
            cache_capacity: 32,
            land_cover_last_year: 2018,
            ef_table: None,
            alternative_ef_table: None,
        }
    }
}

impl EmissionsConfig {
    /// Parse YAML; omitted fields keep their defaults.
    pub fn from_yaml(text: &str) -> FireResult<Self> {
        serde_yaml::from_str(text).map_err(|e| FireError::Config(format!("invalid config: {}", e)))
    }

    pub fn from_path(path: impl AsRef<Path>) -> FireResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FireError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&text)
    }

    /// Load from an optional file, apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> FireResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `FIRECAM_DATA_DIR`, `FIRECAM_REFERENCE_DIR` and
    /// `FIRECAM_CACHE_CAPACITY`.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("FIRECAM_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("FIRECAM_REFERENCE_DIR") {
            self.reference_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("FIRECAM_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                self.cache_capacity = capacity;
            }
        }
    }

    /// Settings for an inventory, with anything unset taken from the
    /// published defaults.
    pub fn settings(&self, inventory: Inventory) -> InventorySettings {
        match self.inventories.get(&inventory) {
            Some(settings) => settings.clone().or_defaults(inventory),
            None => InventorySettings::default_for(inventory),
        }
    }

    pub fn validate(&self) -> FireResult<()> {
        self.comparison_grid.resolve()?;

        for inventory in Inventory::ALL {
            let settings = self.settings(inventory);
            settings.grid()?;

            let c = settings.coverage();
            if c.first_year > c.last_year {
                return Err(FireError::Config(format!(
                    "{}: coverage starts ({}) after it ends ({})",
                    inventory, c.first_year, c.last_year
                )));
            }
            let divisor = settings.divisor();
            if !(divisor.is_finite() && divisor > 0.0) {
                return Err(FireError::Config(format!(
                    "{}: scale_divisor must be a positive number",
                    inventory
                )));
            }
        }

        if self.reducer.coverage_samples == 0 || self.reducer.coverage_samples > 32 {
            return Err(FireError::Config(
                "reducer.coverage_samples must be 1-32".to_string(),
            ));
        }

        debug!(data_dir = %self.data_dir.display(), "Validated emissions config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_published_coverage() {
        let config = EmissionsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.settings(Inventory::Gfed4s).coverage(),
            Coverage::new(1997, 2019, 2016)
        );
        assert_eq!(config.settings(Inventory::Qfed25).divisor(), 1e9);
        assert_eq!(config.settings(Inventory::Gfed4s).divisor(), 1.0);
        assert_eq!(config.land_cover_last_year, 2018);
        assert_eq!(config.settings(Inventory::Gfed4s).daily_first_year, Some(2003));
        assert_eq!(
            config.comparison_grid.resolve().unwrap(),
            grids::geographic_0p5()
        );
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
data_dir: /srv/firecam
cache_capacity: 0
inventories:
  FINNv1p5:
    grid: geographic_0p5
    coverage: { first_year: 2002, last_year: 2018, final_year: 2016 }
reducer:
  weighting: area_weighted
"#;
        let config = EmissionsConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/firecam"));
        assert_eq!(config.cache_capacity, 0);
        assert_eq!(config.reducer.weighting, Weighting::AreaWeighted);
        assert_eq!(config.reducer.statistic, Statistic::Sum);

        let finn = config.settings(Inventory::Finn15);
        assert_eq!(finn.coverage().first_year, 2002);
        assert_eq!(finn.divisor(), 1e9);
        // inventories missing from the map keep their defaults
        assert_eq!(
            config.settings(Inventory::Gfed4s),
            InventorySettings::default_for(Inventory::Gfed4s)
        );
    }

    #[test]
    fn test_partial_gfed_entry_keeps_unit_and_daily_defaults() {
        let yaml = r#"
inventories:
  GFEDv4s:
    grid: geographic_0p25
    coverage: { first_year: 1997, last_year: 2018, final_year: 2016 }
"#;
        let config = EmissionsConfig::from_yaml(yaml).unwrap();
        assert!(config.validate().is_ok());

        let gfed = config.settings(Inventory::Gfed4s);
        assert_eq!(gfed.divisor(), 1.0);
        assert_eq!(gfed.daily_first_year, Some(2003));
        assert_eq!(gfed.coverage().last_year, 2018);

        // an entry with only a divisor keeps the published grid and coverage
        let yaml = "inventories:\n  QFEDv2p5r1:\n    scale_divisor: 1000.0\n";
        let qfed = EmissionsConfig::from_yaml(yaml).unwrap().settings(Inventory::Qfed25);
        assert_eq!(qfed.divisor(), 1e3);
        assert_eq!(qfed.coverage(), Inventory::Qfed25.default_coverage());
        assert_eq!(qfed.grid().unwrap(), grids::geographic_0p5());
    }

    #[test]
    fn test_custom_grid_spec() {
        let yaml = r#"
comparison_grid:
  crs: "EPSG:4326"
  transform: [5.0, 0.0, -180.0, 0.0, -5.0, 90.0]
  width: 72
  height: 36
"#;
        let config = EmissionsConfig::from_yaml(yaml).unwrap();
        let grid = config.comparison_grid.resolve().unwrap();
        assert_eq!(grid.len(), 72 * 36);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut config = EmissionsConfig::default();
        config.comparison_grid = GridSpec::named("geographic_1p0");
        assert!(matches!(config.validate(), Err(FireError::Config(_))));

        let mut config = EmissionsConfig::default();
        let mut settings = InventorySettings::default_for(Inventory::Feer10);
        settings.scale_divisor = Some(0.0);
        config.inventories.insert(Inventory::Feer10, settings);
        assert!(config.validate().is_err());
    }
}
