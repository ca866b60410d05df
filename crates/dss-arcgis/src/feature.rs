//! Features returned by a query and the page envelope they arrive in.

use dss_core::aoi::as_number;
use dss_core::geo::{Geometry, LatLon, haversine_km};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One feature: attribute map plus optional geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Attribute lookup. Exact match first, then case-insensitive, since
    /// services are inconsistent about field-name casing.
    #[must_use]
    pub fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(field))
                .map(|(_, v)| v)
        })
    }

    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.attribute(field).and_then(as_number)
    }

    /// Non-empty text rendering of a string or numeric attribute.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        match self.attribute(field)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Location of a point feature, or the centroid of anything else.
    #[must_use]
    pub fn location(&self) -> Option<LatLon> {
        self.geometry.as_ref().and_then(Geometry::centroid)
    }

    /// Stable identity used for de-duplication across pages.
    pub(crate) fn identity(&self, id_field: Option<&str>) -> Option<String> {
        let value = match id_field {
            Some(field) => self.attribute(field),
            None => self
                .attribute("objectid")
                .or_else(|| self.attribute("FID")),
        }?;
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Features gathered across every page of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub features: Vec<Feature>,
    /// The page cap was hit while the service still reported more data.
    pub truncated: bool,
    pub pages: u32,
}

impl FeatureSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Feature> {
        self.features.first()
    }

    /// Order features by great-circle distance from `point` and keep the
    /// closest `limit`. Features without a location sort last; ties keep
    /// service order.
    pub fn keep_nearest(&mut self, point: LatLon, limit: usize) {
        let mut ranked: Vec<(f64, Feature)> = self
            .features
            .drain(..)
            .map(|f| {
                let distance = f
                    .location()
                    .map_or(f64::INFINITY, |at| haversine_km(point, at));
                (distance, f)
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.features = ranked.into_iter().take(limit).map(|(_, f)| f).collect();
    }
}

/// A successful page.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryPage {
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, rename = "exceededTransferLimit")]
    pub exceeded_transfer_limit: Option<bool>,
}

/// The `{"error": {...}}` envelope services return, often with HTTP 200.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
}

impl ErrorBody {
    pub fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("unspecified service error");
        if self.details.is_empty() {
            message.to_string()
        } else {
            format!("{message} ({})", self.details.join("; "))
        }
    }
}
