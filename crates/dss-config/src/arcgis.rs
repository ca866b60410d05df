//! Remote feature service client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_backoff_base_ms() -> u64 {
    600
}

const fn default_backoff_cap_ms() -> u64 {
    10_000
}

const fn default_page_size() -> u32 {
    1000
}

const fn default_max_pages() -> u32 {
    50
}

fn default_user_agent() -> String {
    format!("dss/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArcgisConfig {
    /// Service token appended to every query. Empty means anonymous access.
    #[serde(default)]
    pub token: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per page, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on a single backoff delay.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// `resultRecordCount` per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Page cap per query; hitting it marks the result truncated.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ArcgisConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            user_agent: default_user_agent(),
        }
    }
}

impl ArcgisConfig {
    /// The token, if one is configured.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        let token = self.token.trim();
        (!token.is_empty()).then_some(token)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    #[must_use]
    pub const fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "arcgis.max_attempts",
                "must allow at least one attempt",
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::invalid("arcgis.page_size", "must be positive"));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::invalid("arcgis.max_pages", "must be positive"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("arcgis.timeout_secs", "must be positive"));
        }
        Ok(())
    }
}
