//! Indicators computed from other indicators after every source has landed.

use std::collections::BTreeMap;

use dss_core::enums::{AbsentReason, Aggregation};
use dss_core::indicators::IndicatorValue;

type Indicators = BTreeMap<String, IndicatorValue>;

/// Groundwater depth candidates, newest season first.
const DEPTH_SOURCES: [&str; 3] = [
    "gw_post_monsoon_mbgl",
    "gw_during_monsoon_mbgl",
    "gw_pre_monsoon_mbgl",
];

/// `(newer, older)` pairs tried in order for the seasonal delta.
const DELTA_PAIRS: [(&str, &str); 2] = [
    ("gw_post_monsoon_mbgl", "gw_pre_monsoon_mbgl"),
    ("gw_during_monsoon_mbgl", "gw_pre_monsoon_mbgl"),
];

/// `(indicator, numerator, denominator)`.
const MGNREGA_RATIOS: [(&str, &str, &str); 3] = [
    (
        "mgnrega_jobcard_issuance_pc",
        "mgnrega_jobcards_issued",
        "mgnrega_jobcards_applied",
    ),
    (
        "mgnrega_activation_pc",
        "mgnrega_active_workers",
        "mgnrega_registered_workers",
    ),
    (
        "mgnrega_women_participation_pc",
        "mgnrega_active_women",
        "mgnrega_active_workers",
    ),
];

/// Add every derived indicator to `indicators`. Derived values whose inputs
/// are missing are recorded as absent with [`AbsentReason::MissingInputs`].
pub fn apply(indicators: &mut Indicators) {
    let derived = [
        ("gw_depth_mbgl", groundwater_depth(indicators)),
        ("gw_seasonal_delta_m", seasonal_delta(indicators)),
        ("gw_category", groundwater_category(indicators)),
    ]
    .into_iter()
    .chain(
        MGNREGA_RATIOS
            .iter()
            .map(|(name, num, den)| (*name, ratio(indicators, num, den))),
    )
    .collect::<Vec<_>>();

    for (name, value) in derived {
        let value = value.unwrap_or_else(|| IndicatorValue::absent(None, AbsentReason::MissingInputs));
        indicators.insert(name.to_string(), value);
    }
}

fn scalar<'a>(indicators: &'a Indicators, name: &str) -> Option<(f64, &'a IndicatorValue)> {
    let value = indicators.get(name)?;
    value.as_scalar().map(|v| (v, value))
}

fn groundwater_depth(indicators: &Indicators) -> Option<IndicatorValue> {
    DEPTH_SOURCES
        .iter()
        .find_map(|name| scalar(indicators, name))
        .map(|(_, value)| value.clone())
}

fn seasonal_delta(indicators: &Indicators) -> Option<IndicatorValue> {
    DELTA_PAIRS.iter().find_map(|(newer, older)| {
        let (new_value, source) = scalar(indicators, newer)?;
        let (old_value, _) = scalar(indicators, older)?;
        Some(IndicatorValue::scalar(
            round2(new_value - old_value),
            Aggregation::Difference,
            2,
            source.layer().unwrap_or_default(),
        ))
    })
}

/// CGWB assessment category for a stage of development in percent.
#[must_use]
pub fn category_for_stage(stage_pc: f64) -> &'static str {
    if stage_pc >= 100.0 {
        "Over-exploited"
    } else if stage_pc >= 90.0 {
        "Critical"
    } else if stage_pc >= 70.0 {
        "Semi-critical"
    } else {
        "Safe"
    }
}

fn groundwater_category(indicators: &Indicators) -> Option<IndicatorValue> {
    let (stage, source) = scalar(indicators, "gw_stage_of_development_pc")?;
    Some(IndicatorValue::Category {
        label: category_for_stage(stage).to_string(),
        code: None,
        layer: source.layer().unwrap_or_default().to_string(),
    })
}

fn ratio(indicators: &Indicators, numerator: &str, denominator: &str) -> Option<IndicatorValue> {
    let (num, source) = scalar(indicators, numerator)?;
    let (den, _) = scalar(indicators, denominator)?;
    (den > 0.0).then(|| {
        IndicatorValue::scalar(
            round2(num / den * 100.0),
            Aggregation::Ratio,
            2,
            source.layer().unwrap_or_default(),
        )
    })
}

/// Round half away from zero to two decimals.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
