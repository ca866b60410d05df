//! Layer table configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LayersConfig {
    /// TOML layer table merged over the built-in layers.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Layer names removed from the registry.
    #[serde(default)]
    pub disabled: Vec<String>,
}
