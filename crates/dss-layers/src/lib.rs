//! # dss-layers
//!
//! Declarative registry of every queryable remote layer.
//!
//! The registry is pure data: it is built once at startup from the built-in
//! table, optionally overlaid with an external TOML table, and is read-only
//! afterwards. A layer that is not in the registry is "not configured", which
//! callers treat exactly like a layer that returned no features.
//!
//! Table shape (both built-in and external):
//!
//! ```toml
//! disabled = ["rural_facilities"]
//!
//! [[layer]]
//! name = "surface_water"
//! url = "https://example.org/arcgis/rest/services/water_bodies/FeatureServer/0"
//! geometry = "point"
//! fields = ["objectid", "name"]
//! ```

mod error;

pub use error::RegistryError;

use std::collections::BTreeMap;
use std::path::Path;

use dss_core::layer::LayerSpec;
use serde::Deserialize;

const BUILTIN_TABLE: &str = include_str!("builtin.toml");

/// One layer table document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayerTable {
    #[serde(default, rename = "layer")]
    layers: Vec<LayerSpec>,
    #[serde(default)]
    disabled: Vec<String>,
}

impl LayerTable {
    fn parse(source: &str) -> Result<Self, RegistryError> {
        let table: Self = toml::from_str(source)?;
        let mut seen = std::collections::BTreeSet::new();
        for spec in &table.layers {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(RegistryError::Duplicate(spec.name.clone()));
            }
        }
        Ok(table)
    }
}

/// Validated, name-keyed set of [`LayerSpec`]s.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: BTreeMap<String, LayerSpec>,
}

impl LayerRegistry {
    /// An empty registry: every lookup is "not configured".
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in deployment table.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the embedded table fails validation.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::empty();
        registry.merge_toml_str(BUILTIN_TABLE)?;
        Ok(registry)
    }

    /// Registry from explicit specs, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Invalid`] for a bad role binding and
    /// [`RegistryError::Duplicate`] when two specs share a name.
    pub fn from_specs(specs: impl IntoIterator<Item = LayerSpec>) -> Result<Self, RegistryError> {
        let mut layers = BTreeMap::new();
        for spec in specs {
            spec.validate()?;
            if layers.contains_key(&spec.name) {
                return Err(RegistryError::Duplicate(spec.name));
            }
            layers.insert(spec.name.clone(), spec);
        }
        Ok(Self { layers })
    }

    /// Built-in table, overlaid with an optional external file, minus the
    /// disabled names.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the file cannot be read or parsed, or any
    /// entry fails validation.
    pub fn configured(file: Option<&Path>, disabled: &[String]) -> Result<Self, RegistryError> {
        let mut registry = Self::builtin()?;
        if let Some(path) = file {
            registry.merge_file(path)?;
        }
        registry.disable(disabled);
        Ok(registry)
    }

    /// Merge a TOML table. Entries replace existing layers by name.
    ///
    /// The table is validated as a whole before anything is applied.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the table is malformed or invalid.
    pub fn merge_toml_str(&mut self, source: &str) -> Result<(), RegistryError> {
        let table = LayerTable::parse(source)?;
        for spec in table.layers {
            if self.layers.contains_key(&spec.name) {
                tracing::debug!(layer = %spec.name, "layer table entry replaces existing layer");
            }
            self.layers.insert(spec.name.clone(), spec);
        }
        self.disable(&table.disabled);
        Ok(())
    }

    /// Read and merge a TOML table from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the file cannot be read, otherwise as
    /// [`LayerRegistry::merge_toml_str`].
    pub fn merge_file(&mut self, path: &Path) -> Result<(), RegistryError> {
        let source = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_toml_str(&source)
    }

    /// Remove layers by name. Unknown names are ignored.
    pub fn disable<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            if self.layers.remove(name.as_ref()).is_some() {
                tracing::debug!(layer = name.as_ref(), "layer disabled");
            }
        }
    }

    /// The layer named `name`, or `None` when it is not configured.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&LayerSpec> {
        self.layers.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// Layers sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &LayerSpec> {
        self.layers.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// `name:url` for every configured layer, sorted by name.
    #[must_use]
    pub fn data_sources(&self) -> Vec<String> {
        self.layers
            .values()
            .map(|l| format!("{}:{}", l.name, l.url))
            .collect()
    }
}
