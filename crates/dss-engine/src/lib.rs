//! # dss-engine
//!
//! The report pipeline for one place name:
//!
//! 1. [`Resolver`] walks state → district → block → village against the
//!    registry's boundary layers and produces an [`AoiContext`].
//! 2. [`Orchestrator`] fetches every catalog source concurrently and folds the
//!    results into an [`IndicatorBundle`], absorbing gaps into notes.
//! 3. [`rules::recommend`] turns the bundle into ranked interventions.
//!
//! [`ReportEngine`] wires the three together and assembles the [`Report`].

pub mod catalog;
pub mod derive;
mod error;
pub mod narrative;
mod orchestrator;
mod resolver;
pub mod rules;
pub mod scope;

pub use catalog::{IndicatorSpec, Measure, Method, default_catalog};
pub use error::{NarrativeError, ResolveError};
pub use narrative::{NarrativeGenerator, NoNarrative};
pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use resolver::{AoiRequest, Resolver};

use dss_arcgis::{FeatureClient, FeatureTransport, HttpTransport};
use dss_core::aoi::AoiContext;
use dss_core::indicators::IndicatorBundle;
use dss_core::recommendation::RuleThresholds;
use dss_core::report::{Report, ReportMeta};
use dss_layers::LayerRegistry;

/// Owns everything a report needs: the query client, the layer registry,
/// the indicator catalog, scheduling settings, rule thresholds, and an
/// optional narrative generator.
pub struct ReportEngine<T = HttpTransport, N = NoNarrative> {
    client: FeatureClient<T>,
    registry: LayerRegistry,
    catalog: Vec<IndicatorSpec>,
    settings: OrchestratorSettings,
    thresholds: RuleThresholds,
    narrative: Option<N>,
}

impl<T: FeatureTransport> ReportEngine<T, NoNarrative> {
    /// Engine with the default catalog, settings, and thresholds, and no
    /// narrative generator.
    pub fn new(client: FeatureClient<T>, registry: LayerRegistry) -> Self {
        Self {
            client,
            registry,
            catalog: default_catalog(),
            settings: OrchestratorSettings::default(),
            thresholds: RuleThresholds::default(),
            narrative: None,
        }
    }
}

impl<T: FeatureTransport, N: NarrativeGenerator> ReportEngine<T, N> {
    #[must_use]
    pub fn with_catalog(mut self, catalog: Vec<IndicatorSpec>) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: RuleThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Attach a narrative generator.
    pub fn with_narrative<M: NarrativeGenerator>(self, narrative: M) -> ReportEngine<T, M> {
        ReportEngine {
            client: self.client,
            registry: self.registry,
            catalog: self.catalog,
            settings: self.settings,
            thresholds: self.thresholds,
            narrative: Some(narrative),
        }
    }

    pub const fn client(&self) -> &FeatureClient<T> {
        &self.client
    }

    pub const fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub const fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Resolve `request` to an AOI.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub async fn resolve(&self, request: &AoiRequest) -> Result<AoiContext, ResolveError> {
        Resolver::new(&self.client, &self.registry)
            .resolve(request)
            .await
    }

    /// Indicator bundle for an already-resolved AOI.
    pub async fn indicators(&self, aoi: &AoiContext) -> IndicatorBundle {
        Orchestrator::new(&self.client, &self.registry, &self.catalog, &self.settings)
            .build(aoi)
            .await
    }

    /// Resolve, fetch, and recommend.
    ///
    /// The returned report carries no timestamp, so identical inputs and
    /// service responses produce identical reports.
    ///
    /// # Errors
    ///
    /// Only resolution failures are returned; see [`Resolver::resolve`].
    pub async fn report(&self, request: &AoiRequest) -> Result<Report, ResolveError> {
        let aoi = self.resolve(request).await?;
        let indicators = self.indicators(&aoi).await;
        let recommendations = rules::recommend(&indicators, &self.thresholds);
        let summary = aoi.summary();

        let narrative = match &self.narrative {
            Some(generator) => match generator.generate(&summary, &indicators).await {
                Ok(narrative) => Some(narrative),
                Err(e) => {
                    tracing::warn!(error = %e, "narrative generation failed; continuing without");
                    None
                }
            },
            None => None,
        };

        let notes = aoi
            .notes()
            .iter()
            .chain(indicators.notes())
            .cloned()
            .collect();
        tracing::info!(
            state = %summary.state.name,
            level = %summary.resolved_level,
            indicators = indicators.len(),
            recommendations = recommendations.len(),
            "report assembled"
        );

        Ok(Report {
            aoi: summary,
            indicators,
            recommendations,
            meta: ReportMeta {
                notes,
                data_sources: self.registry.data_sources(),
                generated_at: None,
            },
            narrative,
        })
    }
}
