//! Top-down AOI resolution: state, then district, block, and village.
//!
//! Only the state is mandatory. Every finer level is best-effort: a missing
//! layer, an unmatched name, or a failed lookup leaves the AOI at the deepest
//! level matched so far and records a note saying so.

use std::collections::BTreeMap;

use dss_arcgis::{Feature, FeatureClient, FeatureQuery, FeatureTransport};
use dss_core::aoi::{AoiContext, ResolvedLevel};
use dss_core::enums::{AdminLevel, ResolutionState};
use dss_core::filter::QueryFilter;
use dss_core::layer::LayerSpec;
use dss_core::states;
use dss_layers::LayerRegistry;
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::scope::scoped;

/// Place names supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AoiRequest {
    pub state: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
}

impl AoiRequest {
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    #[must_use]
    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into());
        self
    }

    #[must_use]
    pub fn with_village(mut self, village: impl Into<String>) -> Self {
        self.village = Some(village.into());
        self
    }

    /// The trimmed name requested for `level`; blank names count as absent.
    #[must_use]
    pub fn requested(&self, level: AdminLevel) -> Option<&str> {
        let raw = match level {
            AdminLevel::State => Some(self.state.as_str()),
            AdminLevel::District => self.district.as_deref(),
            AdminLevel::Block => self.block.as_deref(),
            AdminLevel::Village => self.village.as_deref(),
        }?;
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Resolves an [`AoiRequest`] against the registry's administrative layers.
pub struct Resolver<'a, T> {
    client: &'a FeatureClient<T>,
    registry: &'a LayerRegistry,
}

impl<'a, T: FeatureTransport> Resolver<'a, T> {
    pub const fn new(client: &'a FeatureClient<T>, registry: &'a LayerRegistry) -> Self {
        Self { client, registry }
    }

    /// Resolve `request` top-down.
    ///
    /// # Errors
    ///
    /// Fails only at the state level: no state name, no state layer, no
    /// matching state, or a failed state query. Finer levels degrade to notes.
    pub async fn resolve(&self, request: &AoiRequest) -> Result<AoiContext, ResolveError> {
        let requested = request
            .requested(AdminLevel::State)
            .ok_or(ResolveError::MissingState)?;
        let mut progress = ResolutionState::Unresolved;

        let state = self.resolve_state(requested).await?;
        progress = progress.advance(ResolutionState::StateResolved)?;
        tracing::info!(
            state = %state.matched_name,
            abbreviation = state.abbreviation.as_deref().unwrap_or("-"),
            "state resolved"
        );
        let mut aoi = AoiContext::new(state)?;

        for level in [AdminLevel::District, AdminLevel::Block, AdminLevel::Village] {
            let Some(name) = request.requested(level) else {
                continue;
            };
            match self.resolve_level(level, name, &aoi).await {
                Ok(resolved) => {
                    progress = progress.advance(ResolutionState::resolved_at(level))?;
                    tracing::info!(%level, name = %resolved.matched_name, "level resolved");
                    aoi.record(resolved)?;
                }
                Err(note) => {
                    tracing::warn!(%level, name, %note, "level not resolved");
                    aoi.skip(level, note)?;
                }
            }
        }

        let deepest = aoi.deepest().level;
        if deepest != AdminLevel::Village {
            aoi.push_note(format!("AOI geometry resolved at {deepest} level."));
        }
        tracing::debug!(%progress, centroid = ?aoi.centroid(), "resolution complete");
        Ok(aoi)
    }

    async fn resolve_state(&self, requested: &str) -> Result<ResolvedLevel, ResolveError> {
        let layer = self
            .registry
            .lookup(AdminLevel::State.as_str())
            .ok_or(ResolveError::StateLayerNotConfigured)?;
        let name_field = layer
            .name_field
            .as_deref()
            .ok_or(ResolveError::StateLayerNotConfigured)?;

        let full_name = states::canonical(requested).unwrap_or(requested);
        let query = FeatureQuery::attribute(QueryFilter::new().text(name_field, full_name));
        let set = self
            .client
            .query(layer, &query)
            .await
            .map_err(|source| ResolveError::StateQuery {
                state: requested.to_string(),
                source,
            })?;
        let feature = set
            .first()
            .ok_or_else(|| ResolveError::StateNotFound(requested.to_string()))?;

        let mut state = matched(AdminLevel::State, layer, feature, full_name);
        state.abbreviation = layer
            .abbreviation_field
            .as_deref()
            .and_then(|field| feature.text(field))
            .or_else(|| states::abbreviation(&state.matched_name).map(str::to_string));
        Ok(state)
    }

    /// Match one sub-state level; `Err` carries the degradation note.
    async fn resolve_level(
        &self,
        level: AdminLevel,
        name: &str,
        aoi: &AoiContext,
    ) -> Result<ResolvedLevel, String> {
        let fallback = aoi.deepest().level;
        let not_configured = || format!("{} layer not configured; using {fallback} boundary.", title(level));

        let Some(layer) = self.registry.lookup(level.as_str()) else {
            return Err(not_configured());
        };
        let Some(name_field) = layer.name_field.as_deref() else {
            tracing::debug!(layer = %layer.name, "layer has no name binding");
            return Err(not_configured());
        };

        let mut filter = match scoped(QueryFilter::new().text(name_field, name), layer, aoi) {
            Ok(filter) => filter,
            Err(gap) => {
                return Err(format!(
                    "{} layer expects the {} {}, which is unavailable; using {fallback} boundary.",
                    title(level),
                    gap.level,
                    gap.form
                ));
            }
        };
        if let Some(parent_field) = layer.parent_field.as_deref()
            && let Some(code) = level
                .parent()
                .and_then(|parent| aoi.level(parent))
                .and_then(|parent| parent.code.as_deref())
        {
            filter = filter.exact(parent_field, code);
        }

        let set = match self.client.query(layer, &FeatureQuery::attribute(filter)).await {
            Ok(set) => set,
            Err(err) => {
                return Err(format!(
                    "{} lookup failed ({err}); using {fallback} boundary.",
                    title(level)
                ));
            }
        };
        set.first()
            .map(|feature| matched(level, layer, feature, name))
            .ok_or_else(|| format!("{} '{name}' not found; using {fallback} boundary.", title(level)))
    }
}

/// `fallback` names the level when the feature carries no name attribute:
/// the table spelling for states, the trimmed request otherwise.
fn matched(level: AdminLevel, layer: &LayerSpec, feature: &Feature, fallback: &str) -> ResolvedLevel {
    let matched_name = layer
        .name_field
        .as_deref()
        .and_then(|field| feature.text(field))
        .unwrap_or_else(|| fallback.to_string());
    ResolvedLevel {
        level,
        matched_name,
        code: layer.code_field.as_deref().and_then(|field| feature.text(field)),
        abbreviation: None,
        source_layer: layer.name.clone(),
        centroid: feature.location(),
        attributes: feature
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

const fn title(level: AdminLevel) -> &'static str {
    match level {
        AdminLevel::State => "State",
        AdminLevel::District => "District",
        AdminLevel::Block => "Block",
        AdminLevel::Village => "Village",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dss_arcgis::RetryPolicy;
    use dss_arcgis::testing::{Reply, ScriptedTransport};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> LayerRegistry {
        LayerRegistry::from_specs([
            LayerSpec {
                name_field: Some("State_FSI".into()),
                abbreviation_field: Some("State_Name".into()),
                code_field: Some("State_Cens".into()),
                ..LayerSpec::new("state", "https://example.test/state/0")
            },
            LayerSpec {
                name_field: Some("District".into()),
                state_field: Some("State".into()),
                state_value: dss_core::enums::ValueForm::Abbreviation,
                ..LayerSpec::new("district", "https://example.test/district/0")
            },
        ])
        .unwrap()
    }

    fn client(transport: ScriptedTransport) -> FeatureClient<ScriptedTransport> {
        FeatureClient::new(transport).with_retry(RetryPolicy::immediate(2))
    }

    #[test]
    fn blank_names_are_not_requested() {
        let request = AoiRequest::new("  Tripura ").with_district("   ");
        assert_eq!(request.requested(AdminLevel::State), Some("Tripura"));
        assert_eq!(request.requested(AdminLevel::District), None);
        assert_eq!(request.requested(AdminLevel::Village), None);
    }

    #[tokio::test]
    async fn empty_state_is_rejected_without_queries() {
        let client = client(ScriptedTransport::new(|_| Reply::empty()));
        let registry = registry();
        let err = Resolver::new(&client, &registry)
            .resolve(&AoiRequest::new(" "))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingState));
        assert_eq!(client.transport().request_count(), 0);
    }

    #[tokio::test]
    async fn unknown_state_fails() {
        let client = client(ScriptedTransport::new(|_| Reply::empty()));
        let registry = registry();
        let err = Resolver::new(&client, &registry)
            .resolve(&AoiRequest::new("Atlantis"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "State 'Atlantis' not found.");
    }

    #[tokio::test]
    async fn abbreviation_is_expanded_before_querying() {
        let client = client(ScriptedTransport::new(|_| {
            Reply::features(
                &[json!({"State_FSI": "Tripura", "State_Name": "TR", "State_Cens": "16"})],
                None,
            )
        }));
        let registry = registry();
        let aoi = Resolver::new(&client, &registry)
            .resolve(&AoiRequest::new("tr"))
            .await
            .unwrap();

        let sent = client.transport().requests();
        assert_eq!(
            sent[0].param("where"),
            Some("UPPER(State_FSI) = UPPER('Tripura')")
        );
        assert_eq!(aoi.state().matched_name, "Tripura");
        assert_eq!(aoi.state().abbreviation.as_deref(), Some("TR"));
        assert_eq!(aoi.state().code.as_deref(), Some("16"));
        assert_eq!(aoi.notes(), ["AOI geometry resolved at state level."]);
    }

    #[tokio::test]
    async fn unnamed_state_feature_takes_the_table_spelling() {
        let mut names = Vec::new();
        for spelling in ["tripura", "TRIPURA", " Tripura "] {
            let client = client(ScriptedTransport::new(|_| {
                Reply::features(&[json!({"State_Name": "TR", "State_Cens": "16"})], None)
            }));
            let registry = registry();
            let aoi = Resolver::new(&client, &registry)
                .resolve(&AoiRequest::new(spelling))
                .await
                .unwrap();
            names.push(aoi.state().matched_name.clone());
        }
        assert_eq!(names, ["Tripura", "Tripura", "Tripura"]);
    }

    #[tokio::test]
    async fn missing_block_layer_degrades_with_note() {
        let client = client(ScriptedTransport::new(|req| {
            if req.url.contains("/state/") {
                Reply::features(&[json!({"State_FSI": "Tripura"})], None)
            } else {
                Reply::features(&[json!({"District": "Dhalai", "State": "TR"})], None)
            }
        }));
        let registry = registry();
        let aoi = Resolver::new(&client, &registry)
            .resolve(&AoiRequest::new("Tripura").with_district("dhalai").with_block("Ambassa"))
            .await
            .unwrap();

        assert_eq!(aoi.deepest().level, AdminLevel::District);
        assert_eq!(aoi.district().unwrap().matched_name, "Dhalai");
        assert_eq!(
            aoi.notes(),
            [
                "Block layer not configured; using district boundary.",
                "AOI geometry resolved at district level.",
            ]
        );
        // abbreviation came from the built-in table
        let district_query = &client.transport().requests_to("/district/")[0];
        assert_eq!(
            district_query.param("where"),
            Some("UPPER(District) = UPPER('dhalai') AND UPPER(State) = UPPER('TR')")
        );
    }

    #[tokio::test]
    async fn unscopable_district_degrades_without_querying() {
        // not in the abbreviation table and no abbreviation attribute
        let client = client(ScriptedTransport::new(|_| {
            Reply::features(&[json!({"State_FSI": "Orissa", "State_Cens": "21"})], None)
        }));
        let registry = registry();
        let aoi = Resolver::new(&client, &registry)
            .resolve(&AoiRequest::new("Orissa").with_district("Bilaspur"))
            .await
            .unwrap();

        assert!(aoi.state().abbreviation.is_none());
        assert!(aoi.district().is_none());
        assert_eq!(
            aoi.notes(),
            [
                "District layer expects the state abbreviation, which is unavailable; using state boundary.",
                "AOI geometry resolved at state level.",
            ]
        );
        assert!(client.transport().requests_to("/district/").is_empty());
    }

    #[tokio::test]
    async fn failed_district_lookup_is_not_fatal() {
        let client = client(ScriptedTransport::new(|req| {
            if req.url.contains("/state/") {
                Reply::features(&[json!({"State_FSI": "Tripura"})], None)
            } else {
                Reply::status(503)
            }
        }));
        let registry = registry();
        let aoi = Resolver::new(&client, &registry)
            .resolve(&AoiRequest::new("Tripura").with_district("Dhalai"))
            .await
            .unwrap();

        assert!(aoi.district().is_none());
        assert!(aoi.notes()[0].starts_with("District lookup failed ("));
        assert!(aoi.notes()[0].ends_with("using state boundary."));
    }
}
