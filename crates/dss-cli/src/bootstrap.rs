use std::path::Path;

use anyhow::Context;
use dss_arcgis::FeatureClient;
use dss_config::DssConfig;
use dss_engine::{OrchestratorSettings, ReportEngine};
use dss_layers::LayerRegistry;

use crate::cli::GlobalFlags;

/// Read `.env`, then the layered configuration (plus `--config` when given).
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<DssConfig> {
    load_dotenv(Path::new(".env"))?;

    match &flags.config {
        Some(path) => DssConfig::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => DssConfig::load().map_err(anyhow::Error::from),
    }
}

fn load_dotenv(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    dotenvy::from_path(path)
        .with_context(|| format!("failed to load dotenv file at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded dotenv file");
    Ok(())
}

/// Registry from the built-in table, the optional external table, and the
/// disabled list.
pub fn registry(config: &DssConfig) -> anyhow::Result<LayerRegistry> {
    LayerRegistry::configured(config.layers.file.as_deref(), &config.layers.disabled)
        .context("failed to build layer registry")
}

/// A live engine over HTTP.
pub fn engine(config: &DssConfig) -> anyhow::Result<ReportEngine> {
    let registry = registry(config)?;
    let client =
        FeatureClient::from_config(&config.arcgis).context("failed to build HTTP client")?;
    if config.arcgis.token().is_none() {
        tracing::debug!("no arcgis token configured; querying anonymously");
    }

    Ok(ReportEngine::new(client, registry)
        .with_settings(OrchestratorSettings::from_config(&config.indicators))
        .with_thresholds(config.rules.clone()))
}
