//! Indicator fetch scheduling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_concurrency() -> usize {
    4
}

const fn default_fetch_timeout_secs() -> u64 {
    20
}

const fn default_deadline_secs() -> u64 {
    60
}

const fn default_nearest_radius_m() -> f64 {
    50_000.0
}

const fn default_nearest_limit() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndicatorsConfig {
    /// Maximum indicator sources fetched at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Timeout for one source, retries included.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Deadline for the whole bundle.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Search radius for nearest-point indicators, in metres.
    #[serde(default = "default_nearest_radius_m")]
    pub nearest_radius_m: f64,

    /// Record limit for nearest-point queries.
    #[serde(default = "default_nearest_limit")]
    pub nearest_limit: u32,
}

impl Default for IndicatorsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            deadline_secs: default_deadline_secs(),
            nearest_radius_m: default_nearest_radius_m(),
            nearest_limit: default_nearest_limit(),
        }
    }
}

impl IndicatorsConfig {
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::invalid(
                "indicators.concurrency",
                "must be positive",
            ));
        }
        if !(self.nearest_radius_m.is_finite() && self.nearest_radius_m > 0.0) {
            return Err(ConfigError::invalid(
                "indicators.nearest_radius_m",
                "must be a positive distance",
            ));
        }
        Ok(())
    }
}
