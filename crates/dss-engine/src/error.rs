//! Engine error types.
//!
//! Only resolution can fail a report. Indicator gaps become notes, and the
//! rule engine is total over any bundle.

use dss_arcgis::QueryError;
use dss_core::enums::{AdminLevel, ResolutionState};
use dss_core::errors::CoreError;

/// The AOI could not be anchored at the state level.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("State is required to resolve an AOI.")]
    MissingState,

    /// No `state` layer, or one without a name binding.
    #[error("State layer not configured.")]
    StateLayerNotConfigured,

    #[error("State '{0}' not found.")]
    StateNotFound(String),

    #[error("state lookup for '{state}' failed: {source}")]
    StateQuery {
        state: String,
        #[source]
        source: QueryError,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ResolveError {
    /// Terminal resolution state for this failure.
    #[must_use]
    pub const fn resolution_state(&self) -> ResolutionState {
        ResolutionState::Failed(AdminLevel::State)
    }
}

/// Failure reported by a narrative generator. Never fails a report.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("narrative generator unavailable: {0}")]
    Unavailable(String),

    #[error("narrative generation failed: {0}")]
    Failed(String),
}
