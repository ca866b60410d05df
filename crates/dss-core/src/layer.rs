//! Declarative description of a remote feature layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{GeometryKind, ValueForm};
use crate::errors::CoreError;

/// One queryable feature layer: its endpoint, the attributes to request, and
/// which attribute plays which semantic role.
///
/// Role bindings are optional; query construction only uses the roles a layer
/// declares. [`LayerSpec::validate`] checks that every bound role names one of
/// the requested attributes (case-insensitively, as feature services do).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LayerSpec {
    pub name: String,
    pub url: String,
    /// Requested attributes, in order. Empty means `*`.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub geometry: GeometryKind,
    #[serde(default)]
    pub description: Option<String>,

    /// Attribute matched against a user-supplied place name.
    #[serde(default)]
    pub name_field: Option<String>,
    /// Attribute scoping this layer to a state.
    #[serde(default)]
    pub state_field: Option<String>,
    /// Form of the state value written into `state_field`.
    #[serde(default)]
    pub state_value: ValueForm,
    /// Attribute scoping this layer to a district.
    #[serde(default)]
    pub district_field: Option<String>,
    /// Form of the district value written into `district_field`.
    #[serde(default)]
    pub district_value: ValueForm,
    /// Attribute holding the code of the immediate parent level.
    #[serde(default)]
    pub parent_field: Option<String>,
    /// Attribute holding this feature's own code.
    #[serde(default)]
    pub code_field: Option<String>,
    /// Attribute holding the measured value.
    #[serde(default)]
    pub value_field: Option<String>,
    /// Attribute holding a two-letter abbreviation (state layers).
    #[serde(default)]
    pub abbreviation_field: Option<String>,
    /// Attribute identifying a feature across pages.
    #[serde(default)]
    pub id_field: Option<String>,
}

impl LayerSpec {
    /// Minimal spec with no role bindings.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            fields: Vec::new(),
            geometry: GeometryKind::Polygon,
            description: None,
            name_field: None,
            state_field: None,
            state_value: ValueForm::Name,
            district_field: None,
            district_value: ValueForm::Name,
            parent_field: None,
            code_field: None,
            value_field: None,
            abbreviation_field: None,
            id_field: None,
        }
    }

    /// Bound roles as `(role, attribute)` pairs.
    pub fn role_bindings(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("name_field", &self.name_field),
            ("state_field", &self.state_field),
            ("district_field", &self.district_field),
            ("parent_field", &self.parent_field),
            ("code_field", &self.code_field),
            ("value_field", &self.value_field),
            ("abbreviation_field", &self.abbreviation_field),
            ("id_field", &self.id_field),
        ]
        .into_iter()
        .filter_map(|(role, field)| field.as_deref().map(|f| (role, f)))
    }

    /// Check the descriptor is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a blank name or URL, and
    /// [`CoreError::UnknownRoleField`] when a bound role is not among the
    /// requested attributes. A layer requesting `*` skips the role check;
    /// mismatches then surface from the remote service.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("layer name is empty".into()));
        }
        if self.url.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "layer '{}' has no endpoint url",
                self.name
            )));
        }
        if self.fields.is_empty() {
            return Ok(());
        }
        for (role, field) in self.role_bindings() {
            if !self.requests(field) {
                return Err(CoreError::UnknownRoleField {
                    layer: self.name.clone(),
                    role,
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether `field` is among the requested attributes.
    #[must_use]
    pub fn requests(&self, field: &str) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f.eq_ignore_ascii_case(field))
    }

    /// Comma-joined `outFields` parameter.
    #[must_use]
    pub fn out_fields(&self) -> String {
        if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(",")
        }
    }

    /// The layer's `/query` endpoint.
    #[must_use]
    pub fn query_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        if base.ends_with("/query") {
            base.to_string()
        } else {
            format!("{base}/query")
        }
    }
}
