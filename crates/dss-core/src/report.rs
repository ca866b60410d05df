//! The report envelope produced for a resolved AOI.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aoi::AoiSummary;
use crate::indicators::IndicatorBundle;
use crate::recommendation::Recommendation;

/// Report metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportMeta {
    /// Resolution and indicator degradation notes, in pipeline order.
    pub notes: Vec<String>,
    /// `name:url` of every configured layer.
    pub data_sources: Vec<String>,
    /// Set by callers that want a timestamp; the core leaves it empty so the
    /// payload is reproducible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

/// Free text produced by an external narrative generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Narrative {
    pub language: Option<String>,
    pub content: String,
    pub provider: Option<String>,
}

/// The full report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    pub aoi: AoiSummary,
    pub indicators: IndicatorBundle,
    pub recommendations: Vec<Recommendation>,
    pub meta: ReportMeta,
    #[serde(default)]
    pub narrative: Option<Narrative>,
}
