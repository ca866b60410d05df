//! Recommendation rules.
//!
//! Each rule is a predicate over the bundle that yields a rationale when it
//! fires. Every firing rule contributes one recommendation; the result is
//! ordered by descending priority, ties kept in declaration order. A rule
//! whose inputs are absent does not fire.

use dss_core::enums::InterventionType;
use dss_core::indicators::IndicatorBundle;
use dss_core::recommendation::{Recommendation, RuleThresholds};

type Predicate = fn(&IndicatorBundle, &RuleThresholds) -> Option<String>;

struct Rule {
    id: &'static str,
    intervention: InterventionType,
    priority: u32,
    cites: &'static [&'static str],
    predicate: Predicate,
}

const RULES: &[Rule] = &[
    Rule {
        id: "percolation_tank_deep_water",
        intervention: InterventionType::PercolationTank,
        priority: 80,
        cites: &["gw_depth_mbgl"],
        predicate: percolation_tank_deep_water,
    },
    Rule {
        id: "check_dam_overdeveloped_falling",
        intervention: InterventionType::CheckDam,
        priority: 90,
        cites: &["gw_stage_of_development_pc", "gw_seasonal_delta_m"],
        predicate: check_dam_overdeveloped_falling,
    },
    Rule {
        id: "check_dam_groundwater_stress",
        intervention: InterventionType::CheckDam,
        priority: 85,
        cites: &["gw_depth_mbgl"],
        predicate: check_dam_groundwater_stress,
    },
    Rule {
        id: "percolation_tank_groundwater_stress",
        intervention: InterventionType::PercolationTank,
        priority: 82,
        cites: &["gw_depth_mbgl"],
        predicate: percolation_tank_groundwater_stress,
    },
    Rule {
        id: "farm_pond_cropland",
        intervention: InterventionType::FarmPond,
        priority: 60,
        cites: &["cropland_pc"],
        predicate: farm_pond_cropland,
    },
    Rule {
        id: "farm_pond_high_cropland",
        intervention: InterventionType::FarmPond,
        priority: 65,
        cites: &["cropland_pc"],
        predicate: farm_pond_high_cropland,
    },
    Rule {
        id: "farm_pond_remote_water",
        intervention: InterventionType::FarmPond,
        priority: 70,
        cites: &["water_proximity_km", "forest_cover_pc"],
        predicate: farm_pond_remote_water,
    },
    Rule {
        id: "nala_bund_open_terrain",
        intervention: InterventionType::NalaBund,
        priority: 50,
        cites: &["forest_cover_pc", "built_pc"],
        predicate: nala_bund_open_terrain,
    },
];

/// Identifiers of every rule, in declaration order.
pub fn rule_ids() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|r| r.id)
}

/// Evaluate every rule against `bundle`.
#[must_use]
pub fn recommend(bundle: &IndicatorBundle, thresholds: &RuleThresholds) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = RULES
        .iter()
        .filter_map(|rule| {
            let rationale = (rule.predicate)(bundle, thresholds)?;
            tracing::debug!(rule = rule.id, %rationale, "rule fired");
            Some(Recommendation {
                intervention: rule.intervention,
                rule: rule.id.to_string(),
                rationale,
                priority: rule.priority,
                cited_indicators: rule.cites.iter().map(|c| (*c).to_string()).collect(),
            })
        })
        .collect();
    // stable: equal priorities keep declaration order
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    recommendations
}

fn percolation_tank_deep_water(bundle: &IndicatorBundle, t: &RuleThresholds) -> Option<String> {
    let depth = bundle.scalar("gw_depth_mbgl")?;
    (depth > t.percolation_depth_m).then(|| {
        format!(
            "gw_depth_mbgl is {depth:.2} m bgl, deeper than {} m; a percolation tank adds recharge.",
            t.percolation_depth_m
        )
    })
}

fn check_dam_overdeveloped_falling(bundle: &IndicatorBundle, t: &RuleThresholds) -> Option<String> {
    let stage = bundle.scalar("gw_stage_of_development_pc")?;
    let delta = bundle.scalar("gw_seasonal_delta_m")?;
    (stage >= t.stage_critical_pc && delta > 0.0).then(|| {
        format!(
            "gw_stage_of_development_pc is {stage:.1}% (at least {}%) and gw_seasonal_delta_m \
             is +{delta:.2} m, so the water table is still falling; a check dam slows runoff.",
            t.stage_critical_pc
        )
    })
}

fn check_dam_groundwater_stress(bundle: &IndicatorBundle, t: &RuleThresholds) -> Option<String> {
    let depth = bundle.scalar("gw_depth_mbgl")?;
    (depth >= t.gw_stress_threshold_m).then(|| {
        format!(
            "gw_depth_mbgl is {depth:.2} m bgl, at or beyond the {} m stress threshold; \
             a check dam recharges the aquifer.",
            t.gw_stress_threshold_m
        )
    })
}

fn percolation_tank_groundwater_stress(
    bundle: &IndicatorBundle,
    t: &RuleThresholds,
) -> Option<String> {
    let depth = bundle.scalar("gw_depth_mbgl")?;
    (depth >= t.gw_stress_threshold_m).then(|| {
        format!(
            "gw_depth_mbgl is {depth:.2} m bgl, at or beyond the {} m stress threshold; \
             a percolation tank holds runoff long enough to recharge.",
            t.gw_stress_threshold_m
        )
    })
}

fn farm_pond_cropland(bundle: &IndicatorBundle, t: &RuleThresholds) -> Option<String> {
    let cropland = bundle.scalar("cropland_pc")?;
    (cropland >= t.cropland_pond_pc).then(|| {
        format!(
            "cropland_pc is {cropland:.1}%, at least {}%; farm ponds give on-farm storage.",
            t.cropland_pond_pc
        )
    })
}

fn farm_pond_high_cropland(bundle: &IndicatorBundle, t: &RuleThresholds) -> Option<String> {
    let cropland = bundle.scalar("cropland_pc")?;
    (cropland >= t.cropland_high_pc).then(|| {
        format!(
            "cropland_pc is {cropland:.1}%, at least {}%; cropping this intensive warrants an \
             additional farm pond.",
            t.cropland_high_pc
        )
    })
}

fn farm_pond_remote_water(bundle: &IndicatorBundle, t: &RuleThresholds) -> Option<String> {
    let distance = bundle.scalar("water_proximity_km")?;
    let forest = bundle.scalar("forest_cover_pc")?;
    (distance > t.water_remote_km && forest < t.forest_sparse_pc).then(|| {
        format!(
            "water_proximity_km is {distance:.2} km (beyond {} km) and forest_cover_pc is \
             {forest:.1}% (below {}%); a farm pond stores runoff close to fields.",
            t.water_remote_km, t.forest_sparse_pc
        )
    })
}

fn nala_bund_open_terrain(bundle: &IndicatorBundle, t: &RuleThresholds) -> Option<String> {
    let forest = bundle.scalar("forest_cover_pc")?;
    let built = bundle.scalar("built_pc")?;
    (forest < t.forest_open_pc && built < t.built_open_pc).then(|| {
        format!(
            "forest_cover_pc is {forest:.1}% (below {}%) and built_pc is {built:.1}% \
             (below {}%); nala bunds hold water in open drainage lines.",
            t.forest_open_pc, t.built_open_pc
        )
    })
}
