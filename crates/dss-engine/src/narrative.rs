//! Seam for an optional free-text narrative generator.

use std::future::Future;

use dss_core::aoi::AoiSummary;
use dss_core::indicators::IndicatorBundle;
use dss_core::report::Narrative;

use crate::error::NarrativeError;

/// Produces a narrative from the deterministic part of a report.
///
/// Generation is best-effort: the engine logs an error and reports
/// `narrative: null` rather than failing.
pub trait NarrativeGenerator: Send + Sync {
    fn generate(
        &self,
        aoi: &AoiSummary,
        bundle: &IndicatorBundle,
    ) -> impl Future<Output = Result<Narrative, NarrativeError>> + Send;
}

/// Generator used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNarrative;

impl NarrativeGenerator for NoNarrative {
    async fn generate(
        &self,
        _aoi: &AoiSummary,
        _bundle: &IndicatorBundle,
    ) -> Result<Narrative, NarrativeError> {
        Err(NarrativeError::Unavailable(
            "no narrative generator configured".to_string(),
        ))
    }
}
