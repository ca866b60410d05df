//! Concurrent indicator fetching for a resolved AOI.
//!
//! Every catalog entry is evaluated independently, at most `concurrency` at a
//! time, each under its own timeout. The whole build runs against a single
//! deadline; entries still pending when it passes are reported as timed out.
//! Outcomes are slotted back by catalog position, so the bundle does not
//! depend on completion order.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::time::Duration;

use dss_arcgis::{FeatureClient, FeatureQuery, FeatureSet, FeatureTransport, QueryError};
use dss_config::IndicatorsConfig;
use dss_core::aoi::AoiContext;
use dss_core::enums::{AbsentReason, AdminLevel, Aggregation};
use dss_core::geo::min_distance_km;
use dss_core::indicators::{IndicatorBundle, IndicatorValue};
use dss_core::layer::LayerSpec;
use dss_layers::LayerRegistry;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::time::Instant;

use crate::catalog::{IndicatorSpec, Measure, Method};
use crate::derive::{self, round2};
use crate::scope::{Unscopable, scope_filter};

/// Tunables for one bundle build.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub concurrency: usize,
    pub fetch_timeout: Duration,
    pub deadline: Duration,
    pub nearest_radius_m: f64,
    pub nearest_limit: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&IndicatorsConfig::default())
    }
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_config(config: &IndicatorsConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            fetch_timeout: config.fetch_timeout(),
            deadline: config.deadline(),
            nearest_radius_m: config.nearest_radius_m,
            nearest_limit: config.nearest_limit.max(1),
        }
    }
}

/// What one catalog entry contributed.
///
/// `gap` explains why the entry produced nothing and is kept once per source
/// layer. `notes` qualify values that were produced and are all kept.
#[derive(Debug, Default)]
struct SourceOutcome {
    values: Vec<(String, IndicatorValue)>,
    gap: Option<String>,
    notes: Vec<String>,
}

impl SourceOutcome {
    fn absent(spec: &IndicatorSpec, layer: Option<&str>, reason: AbsentReason, note: String) -> Self {
        Self {
            values: spec
                .indicators()
                .into_iter()
                .map(|name| (name.to_string(), IndicatorValue::absent(layer, reason)))
                .collect(),
            gap: Some(note),
            notes: Vec::new(),
        }
    }
}

/// Why a fetch produced no feature set.
struct Gap {
    reason: AbsentReason,
    note: String,
}

/// Builds an [`IndicatorBundle`] from a catalog.
pub struct Orchestrator<'a, T> {
    client: &'a FeatureClient<T>,
    registry: &'a LayerRegistry,
    catalog: &'a [IndicatorSpec],
    settings: &'a OrchestratorSettings,
}

impl<'a, T: FeatureTransport> Orchestrator<'a, T> {
    pub const fn new(
        client: &'a FeatureClient<T>,
        registry: &'a LayerRegistry,
        catalog: &'a [IndicatorSpec],
        settings: &'a OrchestratorSettings,
    ) -> Self {
        Self {
            client,
            registry,
            catalog,
            settings,
        }
    }

    /// Evaluate the catalog against `aoi`. Never fails; gaps become absent
    /// values and notes, at most one gap note per source layer. Identical
    /// notes are reported once.
    pub async fn build(&self, aoi: &AoiContext) -> IndicatorBundle {
        let deadline = Instant::now() + self.settings.deadline;
        let mut slots: Vec<Option<SourceOutcome>> = self.catalog.iter().map(|_| None).collect();

        let mut pending = stream::iter(self.catalog.iter().enumerate())
            .map(|(idx, spec)| async move { (idx, self.evaluate(spec, aoi).await) })
            .buffer_unordered(self.settings.concurrency.max(1));

        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((idx, outcome))) => slots[idx] = Some(outcome),
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        deadline_ms = u64::try_from(self.settings.deadline.as_millis()).unwrap_or(u64::MAX),
                        remaining = slots.iter().filter(|s| s.is_none()).count(),
                        "indicator deadline reached"
                    );
                    break;
                }
            }
        }
        // cancels whatever is still in flight
        drop(pending);

        let mut indicators = BTreeMap::new();
        let mut notes = Vec::new();
        let mut gapped: HashSet<&str> = HashSet::new();
        let mut seen: HashSet<String> = HashSet::new();
        for (spec, slot) in self.catalog.iter().zip(slots) {
            let outcome = slot.unwrap_or_else(|| {
                SourceOutcome::absent(
                    spec,
                    Some(&spec.source),
                    AbsentReason::TimedOut,
                    format!(
                        "Layer '{}' did not respond before the request deadline; {} unavailable.",
                        spec.source,
                        spec.indicators().join(", ")
                    ),
                )
            });
            indicators.extend(outcome.values);
            let gap = outcome
                .gap
                .filter(|_| gapped.insert(spec.source.as_str()));
            for note in gap.into_iter().chain(outcome.notes) {
                if seen.insert(note.clone()) {
                    notes.push(note);
                }
            }
        }

        derive::apply(&mut indicators);
        IndicatorBundle::new(indicators, notes)
    }

    async fn evaluate(&self, spec: &IndicatorSpec, aoi: &AoiContext) -> SourceOutcome {
        let layer = match (&spec.method, self.registry.lookup(&spec.source)) {
            (Method::LevelAttribute { level, measures }, _) => {
                return level_attributes(spec, aoi, *level, measures);
            }
            (_, Some(layer)) => layer,
            (_, None) => {
                tracing::debug!(source = %spec.source, "indicator layer not configured");
                return SourceOutcome::absent(
                    spec,
                    None,
                    AbsentReason::NotConfigured,
                    format!(
                        "Layer '{}' not configured; {} unavailable.",
                        spec.source,
                        spec.indicators().join(", ")
                    ),
                );
            }
        };

        let outcome = match &spec.method {
            Method::Aggregate {
                aggregation,
                measures,
            } => self.aggregate(spec, layer, aoi, *aggregation, measures).await,
            Method::Containing {
                indicator,
                label_fields,
                code_fields,
            } => {
                self.containing(spec, layer, aoi, indicator, label_fields, code_fields)
                    .await
            }
            Method::Nearest {
                indicator,
                category,
            } => self.nearest(spec, layer, aoi, indicator, category.as_ref()).await,
            Method::LevelAttribute { level, measures } => {
                Ok(level_attributes(spec, aoi, *level, measures))
            }
        };

        outcome.unwrap_or_else(|gap| {
            tracing::warn!(
                layer = %layer.name,
                reason = %gap.reason,
                note = %gap.note,
                "indicator source degraded"
            );
            SourceOutcome::absent(spec, Some(&layer.name), gap.reason, gap.note)
        })
    }

    async fn aggregate(
        &self,
        spec: &IndicatorSpec,
        layer: &LayerSpec,
        aoi: &AoiContext,
        aggregation: Aggregation,
        measures: &[Measure],
    ) -> Result<SourceOutcome, Gap> {
        let filter = scope_filter(layer, aoi).map_err(|err| unscopable(&err, spec))?;
        let query = FeatureQuery::attribute(filter).without_geometry();
        let set = self.fetch(spec, layer, &query).await?;

        let count = set.len();
        let values = measures.iter().map(|m| {
            let fields: Vec<&str> = if m.fields.is_empty() {
                layer.value_field.as_deref().into_iter().collect()
            } else {
                m.fields.iter().map(String::as_str).collect()
            };
            let numbers: Vec<f64> = set
                .features
                .iter()
                .filter_map(|f| fields.iter().find_map(|field| f.number(field)))
                .collect();
            tracing::debug!(
                layer = %layer.name,
                indicator = %m.indicator,
                features = count,
                values = numbers.len(),
                "aggregating"
            );
            (m.indicator.as_str(), aggregation.apply(&numbers).map(|v| (v, numbers.len())))
        });

        let mut outcome = SourceOutcome::default();
        let mut missing = Vec::new();
        for (name, value) in values {
            match value {
                Some((value, contributing)) => outcome.values.push((
                    name.to_string(),
                    IndicatorValue::scalar(value, aggregation, contributing, &layer.name),
                )),
                None => {
                    missing.push(name);
                    outcome.values.push((
                        name.to_string(),
                        IndicatorValue::absent(Some(&layer.name), AbsentReason::MissingInputs),
                    ));
                }
            }
        }
        if !missing.is_empty() {
            outcome.notes.push(format!(
                "Layer '{}' returned {count} features without numeric values for {}.",
                layer.name,
                missing.join(", ")
            ));
        }
        Ok(with_truncation(outcome, layer, &set))
    }

    async fn containing(
        &self,
        spec: &IndicatorSpec,
        layer: &LayerSpec,
        aoi: &AoiContext,
        indicator: &str,
        label_fields: &[String],
        code_fields: &[String],
    ) -> Result<SourceOutcome, Gap> {
        let centroid = aoi.centroid().ok_or_else(|| no_centroid(layer))?;
        let filter = scope_filter(layer, aoi).map_err(|err| unscopable(&err, spec))?;
        let query = FeatureQuery::point_in_polygon(centroid).with_filter(filter);
        let set = self.fetch(spec, layer, &query).await?;

        let first_text = |fields: &[String]| {
            set.features
                .iter()
                .find_map(|f| fields.iter().find_map(|field| f.text(field)))
        };
        let Some(label) = first_text(label_fields) else {
            return Err(Gap {
                reason: AbsentReason::MissingInputs,
                note: format!(
                    "Layer '{}' contains the AOI centroid but carries no {indicator} label.",
                    layer.name
                ),
            });
        };
        let outcome = SourceOutcome {
            values: vec![(
                indicator.to_string(),
                IndicatorValue::Category {
                    label,
                    code: first_text(code_fields),
                    layer: layer.name.clone(),
                },
            )],
            ..SourceOutcome::default()
        };
        Ok(with_truncation(outcome, layer, &set))
    }

    async fn nearest(
        &self,
        spec: &IndicatorSpec,
        layer: &LayerSpec,
        aoi: &AoiContext,
        indicator: &str,
        category: Option<&(String, String)>,
    ) -> Result<SourceOutcome, Gap> {
        let centroid = aoi.centroid().ok_or_else(|| no_centroid(layer))?;
        let mut filter = scope_filter(layer, aoi).map_err(|err| unscopable(&err, spec))?;
        if let Some((field, value)) = category {
            filter = filter.text(field, value);
        }
        let query = FeatureQuery::near_point(
            centroid,
            self.settings.nearest_radius_m,
            self.settings.nearest_limit,
        )
        .with_filter(filter);
        let set = self.fetch(spec, layer, &query).await?;

        let points: Vec<_> = set.features.iter().filter_map(|f| f.location()).collect();
        let Some(distance) = min_distance_km(centroid, points.iter().copied()) else {
            return Err(Gap {
                reason: AbsentReason::MissingInputs,
                note: format!("Layer '{}' returned features without point geometry.", layer.name),
            });
        };
        let outcome = SourceOutcome {
            values: vec![(
                indicator.to_string(),
                IndicatorValue::scalar(round2(distance), Aggregation::Min, points.len(), &layer.name),
            )],
            ..SourceOutcome::default()
        };
        Ok(with_truncation(outcome, layer, &set))
    }

    /// Run one query under the per-fetch timeout, mapping every failure and
    /// an empty result to a [`Gap`].
    async fn fetch(
        &self,
        spec: &IndicatorSpec,
        layer: &LayerSpec,
        query: &FeatureQuery,
    ) -> Result<FeatureSet, Gap> {
        let result = with_timeout(self.settings.fetch_timeout, self.client.query(layer, query)).await;
        let unavailable = || spec.indicators().join(", ");
        match result {
            None => Err(Gap {
                reason: AbsentReason::TimedOut,
                note: format!(
                    "Layer '{}' timed out after {}s; {} unavailable.",
                    layer.name,
                    self.settings.fetch_timeout.as_secs_f64(),
                    unavailable()
                ),
            }),
            Some(Err(err)) => Err(query_gap(&err, &unavailable())),
            Some(Ok(set)) if set.is_empty() => Err(Gap {
                reason: AbsentReason::NoFeatures,
                note: format!(
                    "Layer '{}' returned no features for this AOI; {} unavailable.",
                    layer.name,
                    unavailable()
                ),
            }),
            Some(Ok(set)) => Ok(set),
        }
    }
}

async fn with_timeout<F: Future>(limit: Duration, future: F) -> Option<F::Output> {
    tokio::time::timeout(limit, future).await.ok()
}

fn query_gap(err: &QueryError, unavailable: &str) -> Gap {
    Gap {
        reason: AbsentReason::QueryFailed,
        note: format!("Layer '{}' query failed: {err}; {unavailable} unavailable.", err.layer()),
    }
}

fn unscopable(err: &Unscopable, spec: &IndicatorSpec) -> Gap {
    Gap {
        reason: AbsentReason::MissingInputs,
        note: format!(
            "Layer '{}' cannot be scoped to the AOI: the {} {} is unavailable; {} unavailable.",
            err.layer,
            err.level,
            err.form,
            spec.indicators().join(", ")
        ),
    }
}

fn no_centroid(layer: &LayerSpec) -> Gap {
    Gap {
        reason: AbsentReason::NoCentroid,
        note: format!(
            "Layer '{}' skipped: the AOI has no centroid to query from.",
            layer.name
        ),
    }
}

fn with_truncation(mut outcome: SourceOutcome, layer: &LayerSpec, set: &FeatureSet) -> SourceOutcome {
    if set.truncated {
        outcome.notes.push(format!(
            "Layer '{}' hit the page cap after {} pages; values use a partial result.",
            layer.name, set.pages
        ));
    }
    outcome
}

/// Attributes of a resolved level, one scalar per measure.
fn level_attributes(
    spec: &IndicatorSpec,
    aoi: &AoiContext,
    level: AdminLevel,
    measures: &[Measure],
) -> SourceOutcome {
    let Some(resolved) = aoi.level(level) else {
        return SourceOutcome::absent(
            spec,
            None,
            AbsentReason::LevelUnresolved,
            format!(
                "No {level} resolved; {} unavailable.",
                spec.indicators().join(", ")
            ),
        );
    };

    let layer = resolved.source_layer.as_str();
    let mut outcome = SourceOutcome::default();
    let mut missing = Vec::new();
    for measure in measures {
        let value = match measure.fields.iter().find_map(|f| resolved.number(f)) {
            Some(v) => IndicatorValue::scalar(v, Aggregation::Single, 1, layer),
            None => {
                missing.push(measure.indicator.as_str());
                IndicatorValue::absent(Some(layer), AbsentReason::MissingInputs)
            }
        };
        outcome.values.push((measure.indicator.clone(), value));
    }
    if !missing.is_empty() {
        outcome.notes.push(format!(
            "Layer '{}' has no value for {}.",
            spec.source,
            missing.join(", ")
        ));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use dss_arcgis::testing::{Reply, ScriptedTransport};
    use dss_arcgis::{PagingPolicy, RetryPolicy, TransportRequest};
    use dss_core::enums::ValueForm;
    use dss_core::aoi::ResolvedLevel;
    use dss_core::enums::GeometryKind;
    use dss_core::geo::LatLon;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn aoi() -> AoiContext {
        let mut attributes = BTreeMap::new();
        attributes.insert("Per_GA_201".to_string(), json!(73.68));
        AoiContext::new(ResolvedLevel {
            level: AdminLevel::State,
            matched_name: "Tripura".into(),
            code: Some("16".into()),
            abbreviation: Some("TR".into()),
            source_layer: "state".into(),
            centroid: Some(LatLon::new(23.75, 91.75)),
            attributes,
        })
        .unwrap()
    }

    fn groundwater() -> LayerSpec {
        LayerSpec {
            geometry: GeometryKind::Point,
            state_field: Some("State".into()),
            value_field: Some("wl_mbgl".into()),
            ..LayerSpec::new("groundwater_post_monsoon", "https://example.test/gw/3")
        }
    }

    fn client(transport: ScriptedTransport) -> FeatureClient<ScriptedTransport> {
        FeatureClient::new(transport).with_retry(RetryPolicy::immediate(2))
    }

    async fn build(
        transport: ScriptedTransport,
        layers: Vec<LayerSpec>,
        catalog: &[IndicatorSpec],
    ) -> IndicatorBundle {
        build_with(&client(transport), layers, catalog, &aoi()).await
    }

    async fn build_with(
        client: &FeatureClient<ScriptedTransport>,
        layers: Vec<LayerSpec>,
        catalog: &[IndicatorSpec],
        aoi: &AoiContext,
    ) -> IndicatorBundle {
        let registry = LayerRegistry::from_specs(layers).unwrap();
        let settings = OrchestratorSettings::default();
        Orchestrator::new(client, &registry, catalog, &settings)
            .build(aoi)
            .await
    }

    fn offset_of(request: &TransportRequest) -> usize {
        request
            .param("resultOffset")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    fn post_monsoon_mean() -> IndicatorSpec {
        IndicatorSpec::new(
            "groundwater_post_monsoon",
            Method::Aggregate {
                aggregation: Aggregation::Mean,
                measures: vec![Measure::value("gw_post_monsoon_mbgl")],
            },
        )
    }

    #[tokio::test]
    async fn mean_counts_only_numeric_values() {
        let transport = ScriptedTransport::new(|_| {
            Reply::features(
                &[
                    json!({"objectid": 1, "wl_mbgl": 4.0}),
                    json!({"objectid": 2, "wl_mbgl": "5.0"}),
                    json!({"objectid": 3, "wl_mbgl": null}),
                ],
                None,
            )
        });
        let bundle = build(transport, vec![groundwater()], &[post_monsoon_mean()]).await;

        assert_eq!(
            bundle.get("gw_post_monsoon_mbgl"),
            Some(&IndicatorValue::scalar(
                4.5,
                Aggregation::Mean,
                2,
                "groundwater_post_monsoon"
            ))
        );
        assert!(bundle.notes().is_empty());
    }

    #[tokio::test]
    async fn empty_result_is_absent_with_one_note() {
        let bundle = build(
            ScriptedTransport::new(|_| Reply::empty()),
            vec![groundwater()],
            &[post_monsoon_mean()],
        )
        .await;
        assert_eq!(
            bundle.get("gw_post_monsoon_mbgl"),
            Some(&IndicatorValue::absent(
                Some("groundwater_post_monsoon"),
                AbsentReason::NoFeatures
            ))
        );
        assert_eq!(bundle.notes().len(), 1);
    }

    #[tokio::test]
    async fn level_attributes_read_resolved_state() {
        let catalog = [IndicatorSpec::new(
            "state",
            Method::LevelAttribute {
                level: AdminLevel::State,
                measures: vec![
                    Measure::field("forest_cover_pc", &["Per_GA_201"]),
                    Measure::field("scrub_area_sqkm", &["Scrub2019"]),
                ],
            },
        )];
        let transport = ScriptedTransport::new(|_| Reply::empty());
        let bundle = build(transport, Vec::new(), &catalog).await;

        assert_eq!(bundle.scalar("forest_cover_pc"), Some(73.68));
        assert!(bundle.get("scrub_area_sqkm").unwrap().is_absent());
        assert_eq!(bundle.notes(), ["Layer 'state' has no value for scrub_area_sqkm."]);
    }

    #[tokio::test]
    async fn unresolved_level_is_absent() {
        let catalog = [IndicatorSpec::new(
            "district",
            Method::LevelAttribute {
                level: AdminLevel::District,
                measures: vec![Measure::field("gw_stage_of_development_pc", &["Stage_of_d"])],
            },
        )];
        let bundle = build(ScriptedTransport::new(|_| Reply::empty()), Vec::new(), &catalog).await;
        assert_eq!(
            bundle.get("gw_stage_of_development_pc"),
            Some(&IndicatorValue::absent(None, AbsentReason::LevelUnresolved))
        );
        assert_eq!(
            bundle.notes(),
            ["No district resolved; gw_stage_of_development_pc unavailable."]
        );
    }

    #[tokio::test]
    async fn nearest_uses_minimum_distance() {
        let facilities = LayerSpec {
            geometry: GeometryKind::Point,
            ..LayerSpec::new("rural_facilities", "https://example.test/rf/0")
        };
        let transport = ScriptedTransport::new(|_| {
            Reply::json(&json!({"features": [
                {"attributes": {"objectid": 1}, "geometry": {"x": 91.85, "y": 23.75}},
                {"attributes": {"objectid": 2}, "geometry": {"x": 91.76, "y": 23.75}},
            ]}))
        });
        let catalog = [IndicatorSpec::new(
            "rural_facilities",
            Method::Nearest {
                indicator: "access_medical_km".into(),
                category: Some(("facilitycat".into(), "Medical".into())),
            },
        )];
        let client = client(transport);
        let registry = LayerRegistry::from_specs([facilities]).unwrap();
        let settings = OrchestratorSettings::default();
        let bundle = Orchestrator::new(&client, &registry, &catalog, &settings)
            .build(&aoi())
            .await;

        // 0.01 degrees of longitude at 23.75N
        assert_eq!(bundle.scalar("access_medical_km"), Some(1.02));
        let sent = client.transport().requests();
        assert_eq!(
            sent[0].param("where"),
            Some("UPPER(facilitycat) = UPPER('Medical')")
        );
        assert_eq!(sent[0].param("units"), Some("esriMeters"));
    }

    #[tokio::test]
    async fn nearest_ranks_every_page_not_just_the_first() {
        let facilities = LayerSpec {
            geometry: GeometryKind::Point,
            ..LayerSpec::new("rural_facilities", "https://example.test/rf/0")
        };
        // farthest first; the closest one sits alone on the last page
        let rows: Vec<_> = [91.95, 91.90, 91.85, 91.80, 91.751]
            .into_iter()
            .enumerate()
            .map(|(i, x)| json!({"attributes": {"objectid": i}, "geometry": {"x": x, "y": 23.75}}))
            .collect();
        let transport = ScriptedTransport::new(move |req| {
            let offset = offset_of(req);
            let page: Vec<_> = rows.iter().skip(offset).take(2).cloned().collect();
            Reply::json(&json!({"features": page, "exceededTransferLimit": offset + 2 < rows.len()}))
        });
        let client = client(transport).with_paging(PagingPolicy {
            page_size: 2,
            max_pages: 10,
        });
        let catalog = [IndicatorSpec::new(
            "rural_facilities",
            Method::Nearest {
                indicator: "access_medical_km".into(),
                category: None,
            },
        )];

        let bundle = build_with(&client, vec![facilities], &catalog, &aoi()).await;

        assert_eq!(bundle.scalar("access_medical_km"), Some(0.1));
        assert_eq!(client.transport().request_count(), 3);
        assert!(bundle.notes().is_empty());
    }

    #[tokio::test]
    async fn page_cap_note_survives_a_missing_value_note() {
        let transport = ScriptedTransport::new(|req| {
            Reply::features(&[json!({"objectid": offset_of(req), "wl_mbgl": 4.0})], Some(true))
        });
        let client = client(transport).with_paging(PagingPolicy {
            page_size: 1,
            max_pages: 2,
        });
        let catalog = [IndicatorSpec::new(
            "groundwater_post_monsoon",
            Method::Aggregate {
                aggregation: Aggregation::Mean,
                measures: vec![
                    Measure::value("gw_post_monsoon_mbgl"),
                    Measure::field("gw_dtwl_mbgl", &["dtwl_"]),
                ],
            },
        )];

        let bundle = build_with(&client, vec![groundwater()], &catalog, &aoi()).await;

        assert_eq!(bundle.scalar("gw_post_monsoon_mbgl"), Some(4.0));
        assert!(bundle.get("gw_dtwl_mbgl").unwrap().is_absent());
        assert_eq!(
            bundle.notes(),
            [
                "Layer 'groundwater_post_monsoon' returned 2 features without numeric values for gw_dtwl_mbgl.",
                "Layer 'groundwater_post_monsoon' hit the page cap after 2 pages; values use a partial result.",
            ]
        );
    }

    #[tokio::test]
    async fn unscopable_layer_is_absent_without_querying() {
        let client = client(ScriptedTransport::new(|_| {
            Reply::features(&[json!({"objectid": 1, "wl_mbgl": 4.0})], None)
        }));
        let layer = LayerSpec {
            state_value: ValueForm::Abbreviation,
            ..groundwater()
        };
        let aoi = AoiContext::new(ResolvedLevel {
            abbreviation: None,
            ..aoi().state().clone()
        })
        .unwrap();

        let bundle = build_with(&client, vec![layer], &[post_monsoon_mean()], &aoi).await;

        assert_eq!(
            bundle.get("gw_post_monsoon_mbgl"),
            Some(&IndicatorValue::absent(
                Some("groundwater_post_monsoon"),
                AbsentReason::MissingInputs
            ))
        );
        assert_eq!(
            bundle.notes(),
            [
                "Layer 'groundwater_post_monsoon' cannot be scoped to the AOI: the state abbreviation is unavailable; gw_post_monsoon_mbgl unavailable."
            ]
        );
        assert_eq!(client.transport().request_count(), 0);
    }
}
