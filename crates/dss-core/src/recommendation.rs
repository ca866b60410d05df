//! Recommended interventions and the thresholds the rule engine applies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::InterventionType;

/// One recommended intervention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub intervention: InterventionType,
    /// Identifier of the rule that fired.
    pub rule: String,
    pub rationale: String,
    /// Higher ranks first.
    pub priority: u32,
    /// Indicators the rule read.
    pub cited_indicators: Vec<String>,
}

/// Numeric thresholds for the recommendation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RuleThresholds {
    /// Mean groundwater depth (m bgl) above which percolation tanks are recommended.
    pub percolation_depth_m: f64,
    /// Groundwater depth (m bgl) treated as stressed.
    pub gw_stress_threshold_m: f64,
    /// Stage of development (%) at which a block is semi-critical.
    pub stage_critical_pc: f64,
    /// Cropland share (%) that supports on-farm storage.
    pub cropland_pond_pc: f64,
    /// Cropland share (%) intensive enough for an additional pond.
    pub cropland_high_pc: f64,
    /// Distance (km) beyond which surface water counts as remote.
    pub water_remote_km: f64,
    /// Forest cover (%) below which cover is sparse.
    pub forest_sparse_pc: f64,
    /// Forest cover (%) below which terrain is open.
    pub forest_open_pc: f64,
    /// Built-up share (%) below which terrain is open.
    pub built_open_pc: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            percolation_depth_m: 4.0,
            gw_stress_threshold_m: 10.0,
            stage_critical_pc: 70.0,
            cropland_pond_pc: 20.0,
            cropland_high_pc: 35.0,
            water_remote_km: 2.0,
            forest_sparse_pc: 33.0,
            forest_open_pc: 10.0,
            built_open_pc: 15.0,
        }
    }
}
