//! Administrative levels, resolution states, and the small closed vocabularies
//! shared by the layer registry, query client, and rule engine.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// AdminLevel
// ---------------------------------------------------------------------------

/// A level of the administrative hierarchy, ordered from coarsest to finest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    State,
    District,
    Block,
    Village,
}

impl AdminLevel {
    /// Every level, top-down.
    pub const ALL: [Self; 4] = [Self::State, Self::District, Self::Block, Self::Village];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::District => "district",
            Self::Block => "block",
            Self::Village => "village",
        }
    }

    /// The level directly above this one, if any.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::State => None,
            Self::District => Some(Self::State),
            Self::Block => Some(Self::District),
            Self::Village => Some(Self::Block),
        }
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResolutionState
// ---------------------------------------------------------------------------

/// Progress of an AOI resolution.
///
/// ```text
/// unresolved → state_resolved → district_resolved → block_resolved → village_resolved
///            → failed(state)
/// ```
///
/// Levels may be skipped when they are unconfigured or unmatched; a resolution
/// never moves back up the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Unresolved,
    StateResolved,
    DistrictResolved,
    BlockResolved,
    VillageResolved,
    Failed(AdminLevel),
}

impl ResolutionState {
    /// The state reached once `level` has matched.
    #[must_use]
    pub const fn resolved_at(level: AdminLevel) -> Self {
        match level {
            AdminLevel::State => Self::StateResolved,
            AdminLevel::District => Self::DistrictResolved,
            AdminLevel::Block => Self::BlockResolved,
            AdminLevel::Village => Self::VillageResolved,
        }
    }

    /// The deepest matched level, or `None` before the state matched.
    #[must_use]
    pub const fn level(self) -> Option<AdminLevel> {
        match self {
            Self::StateResolved => Some(AdminLevel::State),
            Self::DistrictResolved => Some(AdminLevel::District),
            Self::BlockResolved => Some(AdminLevel::Block),
            Self::VillageResolved => Some(AdminLevel::Village),
            Self::Unresolved | Self::Failed(_) => None,
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Unresolved, Self::StateResolved | Self::Failed(AdminLevel::State)) => true,
            (Self::Unresolved | Self::Failed(_), _) | (_, Self::Unresolved | Self::Failed(_)) => {
                false
            }
            (current, next) => match (current.level(), next.level()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] for a backwards or repeated step.
    pub fn advance(self, next: Self) -> Result<Self, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => f.write_str("unresolved"),
            Self::StateResolved => f.write_str("state_resolved"),
            Self::DistrictResolved => f.write_str("district_resolved"),
            Self::BlockResolved => f.write_str("block_resolved"),
            Self::VillageResolved => f.write_str("village_resolved"),
            Self::Failed(level) => write!(f, "failed({level})"),
        }
    }
}

// ---------------------------------------------------------------------------
// GeometryKind
// ---------------------------------------------------------------------------

/// Geometry type published by a feature layer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    #[default]
    Polygon,
    Point,
}

impl GeometryKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polygon => "polygon",
            Self::Point => "point",
        }
    }

    /// Esri geometry type name.
    #[must_use]
    pub const fn esri_name(self) -> &'static str {
        match self {
            Self::Polygon => "esriGeometryPolygon",
            Self::Point => "esriGeometryPoint",
        }
    }
}

// ---------------------------------------------------------------------------
// ValueForm
// ---------------------------------------------------------------------------

/// The form in which a layer expects a parent level's identity in its
/// parent-filter field (e.g. `"Tripura"`, `"TR"`, or `"16"`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ValueForm {
    /// The matched name of the parent feature.
    #[default]
    Name,
    /// The two-letter abbreviation (state level only).
    Abbreviation,
    /// The parent feature's code attribute.
    Code,
}

impl ValueForm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Abbreviation => "abbreviation",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for ValueForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// How a scalar indicator was computed from its contributing values.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Mean,
    Sum,
    Count,
    Min,
    Max,
    /// A single attribute taken verbatim.
    Single,
    /// Derived as the difference of two other indicators.
    Difference,
    /// Derived as a percentage ratio of two other indicators.
    Ratio,
}

impl Aggregation {
    /// Apply the aggregation to `values`. Returns `None` for an empty input
    /// and for the derived kinds, which are never computed from a flat list.
    #[must_use]
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Self::Sum => Some(values.iter().sum()),
            #[allow(clippy::cast_precision_loss)]
            Self::Count => Some(values.len() as f64),
            Self::Min => values.iter().copied().reduce(f64::min),
            Self::Max => values.iter().copied().reduce(f64::max),
            Self::Single => values.first().copied(),
            Self::Difference | Self::Ratio => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Single => "single",
            Self::Difference => "difference",
            Self::Ratio => "ratio",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AbsentReason
// ---------------------------------------------------------------------------

/// Why an indicator carries no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AbsentReason {
    NotConfigured,
    NoFeatures,
    QueryFailed,
    TimedOut,
    NoCentroid,
    LevelUnresolved,
    MissingInputs,
}

impl AbsentReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::NoFeatures => "no_features",
            Self::QueryFailed => "query_failed",
            Self::TimedOut => "timed_out",
            Self::NoCentroid => "no_centroid",
            Self::LevelUnresolved => "level_unresolved",
            Self::MissingInputs => "missing_inputs",
        }
    }
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// InterventionType
// ---------------------------------------------------------------------------

/// A physical water-harvesting or recharge intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InterventionType {
    CheckDam,
    PercolationTank,
    FarmPond,
    NalaBund,
}

impl InterventionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckDam => "check_dam",
            Self::PercolationTank => "percolation_tank",
            Self::FarmPond => "farm_pond",
            Self::NalaBund => "nala_bund",
        }
    }

    /// Human-readable label used in rationales.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CheckDam => "check dam",
            Self::PercolationTank => "percolation tank",
            Self::FarmPond => "farm pond",
            Self::NalaBund => "nala bund",
        }
    }
}

impl fmt::Display for InterventionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_levels_order_top_down() {
        assert!(AdminLevel::State < AdminLevel::District);
        assert!(AdminLevel::Block < AdminLevel::Village);
        assert_eq!(AdminLevel::Village.parent(), Some(AdminLevel::Block));
        assert_eq!(AdminLevel::State.parent(), None);
    }

    #[test]
    fn resolution_moves_only_downwards() {
        let state = ResolutionState::Unresolved
            .advance(ResolutionState::StateResolved)
            .unwrap();
        let block = state.advance(ResolutionState::BlockResolved).unwrap();
        assert_eq!(block.level(), Some(AdminLevel::Block));
        assert!(block.advance(ResolutionState::DistrictResolved).is_err());
        assert!(block.advance(ResolutionState::BlockResolved).is_err());
    }

    #[test]
    fn only_state_failure_is_reachable() {
        assert!(
            ResolutionState::Unresolved
                .can_transition_to(ResolutionState::Failed(AdminLevel::State))
        );
        assert!(
            !ResolutionState::StateResolved
                .can_transition_to(ResolutionState::Failed(AdminLevel::District))
        );
        assert!(
            !ResolutionState::Unresolved.can_transition_to(ResolutionState::DistrictResolved)
        );
    }

    #[test]
    fn aggregation_apply() {
        let values = [2.0, 4.0, 9.0];
        assert_eq!(Aggregation::Mean.apply(&values), Some(5.0));
        assert_eq!(Aggregation::Sum.apply(&values), Some(15.0));
        assert_eq!(Aggregation::Count.apply(&values), Some(3.0));
        assert_eq!(Aggregation::Min.apply(&values), Some(2.0));
        assert_eq!(Aggregation::Max.apply(&values), Some(9.0));
        assert_eq!(Aggregation::Single.apply(&values), Some(2.0));
        assert_eq!(Aggregation::Difference.apply(&values), None);
        assert_eq!(Aggregation::Mean.apply(&[]), None);
    }

    #[test]
    fn failed_state_serializes_with_level() {
        let json = serde_json::to_string(&ResolutionState::Failed(AdminLevel::State)).unwrap();
        assert_eq!(json, r#"{"failed":"state"}"#);
        assert_eq!(
            ResolutionState::Failed(AdminLevel::State).to_string(),
            "failed(state)"
        );
    }
}
