//! Country boundaries and the alias table for user-entered country names.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::features::FeatureCollection;
use crate::geometry::Geometry;

/// Feature property carrying the country name in boundary files.
pub const COUNTRY_NAME_PROPERTY: &str = "country_na";

const DEFAULT_ALIASES: [(&str, &str); 10] = [
    ("Bahamas", "Bahamas, The"),
    ("Myanmar (Burma)", "Burma"),
    ("Central African Republic", "Central African Rep"),
    ("Democratic Republic of the Congo", "Dem Rep of the Congo"),
    ("Denmark", "Denmark"),
    ("Gambia", "Gambia, The"),
    ("North Korea", "Korea, North"),
    ("South Korea", "Korea, South"),
    ("Rep of the Congo", "Rep of the Congo"),
    ("Solomon Islands", "Solomon Is"),
];

/// Mapping from common country names to boundary-dataset names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryAliases {
    aliases: BTreeMap<String, String>,
}

impl Default for CountryAliases {
    fn default() -> Self {
        Self {
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl CountryAliases {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// Parse a YAML mapping of `alias: dataset name`.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let aliases: BTreeMap<String, String> = serde_yaml::from_str(text)?;
        Ok(Self { aliases })
    }

    /// Load the built-in table extended by a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut table = Self::default();
        table.extend(Self::from_yaml(&text)?);
        Ok(table)
    }

    /// Add entries, replacing existing aliases.
    pub fn extend(&mut self, other: CountryAliases) {
        self.aliases.extend(other.aliases);
    }

    pub fn insert(&mut self, alias: impl Into<String>, name: impl Into<String>) {
        self.aliases.insert(alias.into(), name.into());
    }

    /// Dataset name for `name`; names without an alias pass through.
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Entries sorted by alias.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Country polygons indexed by dataset name.
#[derive(Debug, Clone, Default)]
pub struct CountryBoundaries {
    countries: HashMap<String, Geometry>,
}

impl CountryBoundaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a country, merging with any existing parts of the same name.
    pub fn insert(&mut self, name: impl Into<String>, geometry: Geometry) {
        let name = name.into();
        let merged = match self.countries.remove(&name) {
            Some(existing) => existing.merge(geometry),
            None => geometry,
        };
        self.countries.insert(name, merged);
    }

    /// Build from features carrying a `country_na` property.
    ///
    /// Features without a name, with a point geometry or with invalid
    /// rings are skipped with a warning.
    pub fn from_collection(collection: FeatureCollection) -> Self {
        let mut boundaries = Self::new();
        let mut skipped = 0usize;
        for feature in collection.features {
            let name = match feature.property_str(COUNTRY_NAME_PROPERTY) {
                Some(name) => name.to_string(),
                None => {
                    skipped += 1;
                    continue;
                }
            };
            if feature.geometry.is_point() {
                skipped += 1;
                continue;
            }
            if let Err(e) = feature.geometry.validate() {
                warn!(country = %name, error = %e, "Skipping invalid country boundary");
                skipped += 1;
                continue;
            }
            boundaries.insert(name, feature.geometry);
        }
        if skipped > 0 {
            warn!(skipped, "Skipped unusable country features");
        }
        debug!(countries = boundaries.len(), "Loaded country boundaries");
        boundaries
    }

    /// Load from a GeoJSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_collection(FeatureCollection::from_path(path)?))
    }

    pub fn get(&self, name: &str) -> Option<&Geometry> {
        self.countries.get(name)
    }

    /// Country names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.countries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Feature;

    #[test]
    fn test_default_aliases() {
        let aliases = CountryAliases::default();
        assert_eq!(aliases.len(), 10);
        assert_eq!(aliases.canonical("Bahamas"), "Bahamas, The");
        assert_eq!(aliases.canonical("South Korea"), "Korea, South");
        assert_eq!(aliases.canonical("Brazil"), "Brazil");
    }

    #[test]
    fn test_yaml_extends_defaults() {
        let mut aliases = CountryAliases::default();
        aliases.extend(CountryAliases::from_yaml("Ivory Coast: \"Cote d'Ivoire\"\n").unwrap());
        assert_eq!(aliases.canonical("Ivory Coast"), "Cote d'Ivoire");
        assert_eq!(aliases.canonical("Gambia"), "Gambia, The");
    }

    #[test]
    fn test_boundaries_skip_unusable_features() {
        let square = Geometry::polygon(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]).unwrap();
        let fc = FeatureCollection::new(vec![
            Feature::new(square.clone()).with_property("country_na", "Bahamas, The"),
            Feature::new(square),
            Feature::new(Geometry::point(1.0, 1.0).unwrap()).with_property("country_na", "Nauru"),
        ]);
        let boundaries = CountryBoundaries::from_collection(fc);
        assert_eq!(boundaries.names(), vec!["Bahamas, The"]);
    }
}
