//! Registry error types.

use std::path::PathBuf;

use dss_core::errors::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A layer descriptor failed validation.
    #[error("invalid layer: {0}")]
    Invalid(#[from] CoreError),

    /// The layer table could not be parsed.
    #[error("layer table parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The layer table file could not be read.
    #[error("cannot read layer table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two entries in the same table share a name.
    #[error("duplicate layer name '{0}'")]
    Duplicate(String),
}
