//! # dss-config
//!
//! Layered configuration loading for the DSS pipeline using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`DSS_*` prefix, `__` as separator)
//! 2. Project-level `.dss/config.toml`
//! 3. User-level `~/.config/dss/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `DSS_ARCGIS__TOKEN` -> `arcgis.token`,
//! `DSS_RULES__PERCOLATION_DEPTH_M` -> `rules.percolation_depth_m`, etc.
//!
//! ```no_run
//! use dss_config::DssConfig;
//!
//! let config = DssConfig::load_with_dotenv().expect("config");
//! println!("page size: {}", config.arcgis.page_size);
//! ```

mod arcgis;
mod error;
mod indicators;
mod layers;

pub use arcgis::ArcgisConfig;
pub use dss_core::recommendation::RuleThresholds;
pub use error::ConfigError;
pub use indicators::IndicatorsConfig;
pub use layers::LayersConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DssConfig {
    #[serde(default)]
    pub arcgis: ArcgisConfig,
    #[serde(default)]
    pub indicators: IndicatorsConfig,
    #[serde(default)]
    pub rules: RuleThresholds,
    #[serde(default)]
    pub layers: LayersConfig,
}

impl DssConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`DssConfig::load_with_dotenv`] for `.env`
    /// support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when a source cannot be parsed, and
    /// [`ConfigError::InvalidValue`] when a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Same as [`DssConfig::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Load configuration with an explicit TOML file layered over the
    /// standard files and under the environment.
    ///
    /// # Errors
    ///
    /// Same as [`DssConfig::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let figment = Self::file_figment()
            .merge(Toml::file(path))
            .merge(Self::env_provider());
        Self::from_figment(figment)
    }

    /// Extract and validate.
    ///
    /// # Errors
    ///
    /// Same as [`DssConfig::load`].
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        Self::file_figment().merge(Self::env_provider())
    }

    fn file_figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".dss/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
    }

    fn env_provider() -> Env {
        Env::prefixed("DSS_").split("__")
    }

    /// Range checks that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arcgis.validate()?;
        self.indicators.validate()?;
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dss").join("config.toml"))
    }
}
