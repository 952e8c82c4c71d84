#![forbid(unsafe_code)]

//! Item definitions and the lookup seam the inventory reads them through.
//!
//! Definitions belong to an external collaborator (an item database, an asset
//! pipeline). The engine only reads the footprint and the rotation flag; the
//! display name rides along for logging.

use std::fmt;
#[cfg(feature = "config")]
use std::path::Path;

use gridstash_core::Footprint;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[cfg(feature = "config")]
use crate::error::ConfigError;
use crate::error::DefinitionError;

/// Stable key naming an item definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionKey(String);

impl DefinitionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DefinitionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

fn default_allow_rotation() -> bool {
    true
}

/// Read-only description of an item kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub key: DefinitionKey,
    #[serde(default)]
    pub display_name: String,
    /// Width in cells when unrotated.
    pub width: u16,
    /// Height in cells when unrotated.
    pub height: u16,
    #[serde(default = "default_allow_rotation")]
    pub allow_rotation: bool,
}

impl ItemDefinition {
    pub fn new(key: impl Into<String>, width: u16, height: u16) -> Self {
        let key = key.into();
        Self {
            display_name: key.clone(),
            key: DefinitionKey(key),
            width,
            height,
            allow_rotation: true,
        }
    }

    /// Builder-style display name override.
    #[must_use]
    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Builder-style rotation lock.
    #[must_use]
    pub fn without_rotation(mut self) -> Self {
        self.allow_rotation = false;
        self
    }

    /// Unrotated footprint.
    pub fn footprint(&self) -> Result<Footprint, DefinitionError> {
        Footprint::new(self.width, self.height).map_err(|source| {
            DefinitionError::InvalidFootprint {
                key: self.key.clone(),
                source,
            }
        })
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.key.as_str().trim().is_empty() {
            return Err(DefinitionError::EmptyKey);
        }
        self.footprint().map(|_| ())
    }
}

/// Lookup seam for item definitions.
pub trait DefinitionSource {
    fn definition(&self, key: &DefinitionKey) -> Option<&ItemDefinition>;
}

impl<S: DefinitionSource + ?Sized> DefinitionSource for &S {
    fn definition(&self, key: &DefinitionKey) -> Option<&ItemDefinition> {
        (**self).definition(key)
    }
}

/// In-memory definition table.
#[derive(Debug, Clone, Default)]
pub struct DefinitionCatalog {
    definitions: FxHashMap<DefinitionKey, ItemDefinition>,
}

#[cfg(feature = "config")]
#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<ItemDefinition>,
}

impl DefinitionCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from definitions, rejecting invalid or duplicate entries.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ItemDefinition>,
    ) -> Result<Self, DefinitionError> {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition)?;
        }
        Ok(catalog)
    }

    /// Register a definition.
    pub fn insert(&mut self, definition: ItemDefinition) -> Result<(), DefinitionError> {
        definition.validate()?;
        if self.definitions.contains_key(&definition.key) {
            return Err(DefinitionError::Duplicate {
                key: definition.key,
            });
        }
        self.definitions.insert(definition.key.clone(), definition);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &DefinitionKey) -> Option<&ItemDefinition> {
        self.definitions.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions sorted by key.
    #[must_use]
    pub fn sorted(&self) -> Vec<&ItemDefinition> {
        let mut defs: Vec<_> = self.definitions.values().collect();
        defs.sort_by(|a, b| a.key.cmp(&b.key));
        defs
    }

    /// Load from a TOML string containing `[[items]]` tables.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = toml::from_str(s)?;
        Ok(Self::from_definitions(file.items)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string shaped `{"items": [...]}`.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = serde_json::from_str(s)?;
        Ok(Self::from_definitions(file.items)?)
    }
}

impl DefinitionSource for DefinitionCatalog {
    fn definition(&self, key: &DefinitionKey) -> Option<&ItemDefinition> {
        self.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_duplicates_and_bad_sizes() {
        let mut catalog = DefinitionCatalog::new();
        catalog.insert(ItemDefinition::new("potion", 1, 1)).unwrap();
        assert_eq!(
            catalog.insert(ItemDefinition::new("potion", 1, 2)),
            Err(DefinitionError::Duplicate {
                key: DefinitionKey::new("potion")
            })
        );
        assert!(matches!(
            catalog.insert(ItemDefinition::new("void", 0, 1)),
            Err(DefinitionError::InvalidFootprint { .. })
        ));
        assert_eq!(
            catalog.insert(ItemDefinition::new("  ", 1, 1)),
            Err(DefinitionError::EmptyKey)
        );
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn builder_flags() {
        let def = ItemDefinition::new("shield", 2, 3)
            .named("Kite Shield")
            .without_rotation();
        assert_eq!(def.display_name, "Kite Shield");
        assert!(!def.allow_rotation);
        assert_eq!(def.footprint().unwrap().area(), 6);
    }

    #[test]
    fn borrowed_catalog_is_a_source() {
        let catalog =
            DefinitionCatalog::from_definitions([ItemDefinition::new("gem", 1, 1)]).unwrap();
        let source: &dyn DefinitionSource = &&catalog;
        assert!(source.definition(&"gem".into()).is_some());
        assert!(source.definition(&"rock".into()).is_none());
    }

    #[cfg(feature = "config")]
    #[test]
    fn loads_toml_items() {
        let catalog = DefinitionCatalog::from_toml_str(
            r#"
            [[items]]
            key = "sword"
            display_name = "Short Sword"
            width = 1
            height = 3

            [[items]]
            key = "anvil"
            width = 2
            height = 2
            allow_rotation = false
            "#,
        )
        .unwrap();
        let sorted: Vec<_> = catalog.sorted().iter().map(|d| d.key.as_str()).collect();
        assert_eq!(sorted, vec!["anvil", "sword"]);
        let sword = catalog.get(&"sword".into()).unwrap();
        assert!(sword.allow_rotation);
        assert_eq!(sword.display_name, "Short Sword");
        assert!(!catalog.get(&"anvil".into()).unwrap().allow_rotation);
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_duplicates_surface_as_definition_errors() {
        let err = DefinitionCatalog::from_json_str(
            r#"{"items": [{"key": "a", "width": 1, "height": 1},
                          {"key": "a", "width": 2, "height": 1}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Definition(DefinitionError::Duplicate { .. })
        ));
    }
}
