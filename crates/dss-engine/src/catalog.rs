//! The indicator catalog: which source feeds which indicators, and how.

use dss_core::enums::{AdminLevel, Aggregation};

/// One output indicator read from one or more candidate attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    pub indicator: String,
    /// Candidate attributes, first numeric one wins. Empty means the
    /// layer's `value_field`.
    pub fields: Vec<String>,
}

impl Measure {
    /// Read the layer's bound `value_field`.
    #[must_use]
    pub fn value(indicator: &str) -> Self {
        Self {
            indicator: indicator.to_string(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(indicator: &str, fields: &[&str]) -> Self {
        Self {
            indicator: indicator.to_string(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

/// How a source turns features into indicator values.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    /// Attribute query scoped to the AOI; each measure aggregated over
    /// every returned feature.
    Aggregate {
        aggregation: Aggregation,
        measures: Vec<Measure>,
    },
    /// Polygon containing the AOI centroid; label and code taken verbatim
    /// from the first non-empty candidate attribute.
    Containing {
        indicator: String,
        label_fields: Vec<String>,
        code_fields: Vec<String>,
    },
    /// Great-circle distance from the AOI centroid to the nearest point
    /// feature, optionally restricted to one category.
    Nearest {
        indicator: String,
        category: Option<(String, String)>,
    },
    /// Attributes of an already-resolved administrative level, verbatim.
    LevelAttribute {
        level: AdminLevel,
        measures: Vec<Measure>,
    },
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    /// Layer name in the registry.
    pub source: String,
    pub method: Method,
}

impl IndicatorSpec {
    #[must_use]
    pub fn new(source: &str, method: Method) -> Self {
        Self {
            source: source.to_string(),
            method,
        }
    }

    /// Names of the indicators this entry produces.
    #[must_use]
    pub fn indicators(&self) -> Vec<&str> {
        match &self.method {
            Method::Aggregate { measures, .. } | Method::LevelAttribute { measures, .. } => {
                measures.iter().map(|m| m.indicator.as_str()).collect()
            }
            Method::Containing { indicator, .. } | Method::Nearest { indicator, .. } => {
                vec![indicator.as_str()]
            }
        }
    }
}

fn mean_of(source: &str, indicator: &str) -> IndicatorSpec {
    IndicatorSpec::new(
        source,
        Method::Aggregate {
            aggregation: Aggregation::Mean,
            measures: vec![Measure::value(indicator)],
        },
    )
}

fn facility(indicator: &str, category: &str) -> IndicatorSpec {
    IndicatorSpec::new(
        "rural_facilities",
        Method::Nearest {
            indicator: indicator.to_string(),
            category: Some(("facilitycat".to_string(), category.to_string())),
        },
    )
}

/// The catalog used for reports unless one is supplied.
///
/// `surface_water` and `lulc` are listed so their indicators show up as
/// absent until a layer with that name is configured.
#[must_use]
pub fn default_catalog() -> Vec<IndicatorSpec> {
    vec![
        mean_of("groundwater_pre_monsoon", "gw_pre_monsoon_mbgl"),
        mean_of("groundwater_during_monsoon", "gw_during_monsoon_mbgl"),
        mean_of("groundwater_post_monsoon", "gw_post_monsoon_mbgl"),
        IndicatorSpec::new(
            "aquifer",
            Method::Containing {
                indicator: "aquifer_type".to_string(),
                label_fields: ["aquifer", "aquifers", "aquifer_0", "systems"]
                    .map(String::from)
                    .to_vec(),
                code_fields: ["new_code_14", "newcode43"].map(String::from).to_vec(),
            },
        ),
        IndicatorSpec::new(
            "state",
            Method::LevelAttribute {
                level: AdminLevel::State,
                measures: vec![
                    Measure::field("forest_cover_pc", &["Per_GA_201"]),
                    Measure::field("forest_area_sqkm", &["Forest_201"]),
                    Measure::field("scrub_area_sqkm", &["Scrub2019"]),
                    Measure::field("geographic_area_sqkm", &["GA_sqkm"]),
                ],
            },
        ),
        IndicatorSpec::new(
            "district",
            Method::LevelAttribute {
                level: AdminLevel::District,
                measures: vec![
                    Measure::field("gw_stage_of_development_pc", &["Stage_of_d"]),
                    Measure::field("gw_annual_extraction_mcm", &["Annual_Gro", "Annual_G00"]),
                    Measure::field("gw_net_available_mcm", &["Net_Ground", "Ground_Wat"]),
                ],
            },
        ),
        IndicatorSpec::new(
            "mgnrega_workers",
            Method::Aggregate {
                aggregation: Aggregation::Sum,
                measures: vec![
                    Measure::field("mgnrega_jobcards_applied", &["number_of_jobcards_applied_for"]),
                    Measure::field("mgnrega_jobcards_issued", &["number_of_jobcards_issued"]),
                    Measure::field("mgnrega_registered_workers", &["registered_workers_total"]),
                    Measure::field("mgnrega_active_workers", &["active_workers_total_workers"]),
                    Measure::field("mgnrega_active_women", &["active_workers_women"]),
                ],
            },
        ),
        facility("access_agro_km", "Agro"),
        facility("access_education_km", "Education"),
        facility("access_medical_km", "Medical"),
        facility("access_transport_km", "Transport/Admin"),
        IndicatorSpec::new(
            "surface_water",
            Method::Nearest {
                indicator: "water_proximity_km".to_string(),
                category: None,
            },
        ),
        IndicatorSpec::new(
            "lulc",
            Method::Aggregate {
                aggregation: Aggregation::Mean,
                measures: vec![
                    Measure::field("cropland_pc", &["cropland_pc", "cropland"]),
                    Measure::field("built_pc", &["built_pc", "built"]),
                ],
            },
        ),
    ]
}
