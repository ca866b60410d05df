//! Indicator values and the per-request bundle.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AbsentReason, Aggregation};

/// The value of one indicator, with the layer that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorValue {
    Scalar {
        value: f64,
        aggregation: Aggregation,
        /// Number of contributing features.
        count: usize,
        layer: String,
    },
    Category {
        label: String,
        code: Option<String>,
        layer: String,
    },
    Absent {
        layer: Option<String>,
        reason: AbsentReason,
    },
}

impl IndicatorValue {
    #[must_use]
    pub fn scalar(value: f64, aggregation: Aggregation, count: usize, layer: &str) -> Self {
        Self::Scalar {
            value,
            aggregation,
            count,
            layer: layer.to_string(),
        }
    }

    #[must_use]
    pub fn absent(layer: Option<&str>, reason: AbsentReason) -> Self {
        Self::Absent {
            layer: layer.map(str::to_string),
            reason,
        }
    }

    #[must_use]
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar { value, .. } => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Self::Category { label, .. } => Some(label),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent { .. })
    }

    /// Provenance layer, if any.
    #[must_use]
    pub fn layer(&self) -> Option<&str> {
        match self {
            Self::Scalar { layer, .. } | Self::Category { layer, .. } => Some(layer),
            Self::Absent { layer, .. } => layer.as_deref(),
        }
    }
}

/// All indicators computed for one AOI, plus notes on what was degraded.
///
/// Indicators are keyed by name in a sorted map so that serialization does not
/// depend on the order in which fetches completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndicatorBundle {
    indicators: BTreeMap<String, IndicatorValue>,
    notes: Vec<String>,
}

impl IndicatorBundle {
    #[must_use]
    pub const fn new(indicators: BTreeMap<String, IndicatorValue>, notes: Vec<String>) -> Self {
        Self { indicators, notes }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IndicatorValue> {
        self.indicators.get(name)
    }

    /// Scalar value of `name`; `None` when missing, absent, or categorical.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(IndicatorValue::as_scalar)
    }

    #[must_use]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(IndicatorValue::as_label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndicatorValue)> {
        self.indicators.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}
