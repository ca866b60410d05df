//! The resolved Area of Interest.
//!
//! An [`AoiContext`] is built by the resolver one level at a time, top-down.
//! Once a level is written it is never replaced, and a level can only be
//! written after every coarser level has been attempted.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AdminLevel, ResolutionState, ValueForm};
use crate::errors::CoreError;
use crate::geo::LatLon;

/// One matched administrative feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedLevel {
    pub level: AdminLevel,
    /// Canonical name as published by the layer (not the user's spelling).
    pub matched_name: String,
    pub code: Option<String>,
    pub abbreviation: Option<String>,
    pub source_layer: String,
    pub centroid: Option<LatLon>,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ResolvedLevel {
    /// This level's identity in the requested form, as a child layer expects
    /// it in a parent-filter field.
    #[must_use]
    pub fn value_as(&self, form: ValueForm) -> Option<&str> {
        match form {
            ValueForm::Name => Some(self.matched_name.as_str()),
            ValueForm::Abbreviation => self.abbreviation.as_deref(),
            ValueForm::Code => self.code.as_deref(),
        }
    }

    /// Numeric attribute, accepting numbers and numeric strings.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        self.attribute(field).and_then(as_number)
    }

    /// Attribute lookup, case-insensitive on the attribute name.
    #[must_use]
    pub fn attribute(&self, field: &str) -> Option<&serde_json::Value> {
        self.attributes.get(field).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(field))
                .map(|(_, v)| v)
        })
    }
}

/// Interpret a JSON attribute as a finite number.
#[must_use]
pub fn as_number(value: &serde_json::Value) -> Option<f64> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// The hierarchy resolved for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AoiContext {
    state: ResolvedLevel,
    district: Option<ResolvedLevel>,
    block: Option<ResolvedLevel>,
    village: Option<ResolvedLevel>,
    last_attempted: AdminLevel,
    notes: Vec<String>,
}

impl AoiContext {
    /// Start a context from a matched state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `state` is not a state-level match.
    pub fn new(state: ResolvedLevel) -> Result<Self, CoreError> {
        if state.level != AdminLevel::State {
            return Err(CoreError::Validation(format!(
                "AOI must start at the state level, got {}",
                state.level
            )));
        }
        Ok(Self {
            state,
            district: None,
            block: None,
            village: None,
            last_attempted: AdminLevel::State,
            notes: Vec::new(),
        })
    }

    /// Write a matched sub-state level.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] if the level is not deeper than
    /// every level already attempted (which also rules out overwrites).
    pub fn record(&mut self, resolved: ResolvedLevel) -> Result<(), CoreError> {
        let level = resolved.level;
        self.attempt(level)?;
        match level {
            AdminLevel::District => self.district = Some(resolved),
            AdminLevel::Block => self.block = Some(resolved),
            AdminLevel::Village => self.village = Some(resolved),
            // rejected by attempt()
            AdminLevel::State => {}
        }
        Ok(())
    }

    /// Mark a level as attempted without a match, recording why.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] under the same rule as
    /// [`AoiContext::record`].
    pub fn skip(&mut self, level: AdminLevel, note: impl Into<String>) -> Result<(), CoreError> {
        self.attempt(level)?;
        self.notes.push(note.into());
        Ok(())
    }

    fn attempt(&mut self, level: AdminLevel) -> Result<(), CoreError> {
        if level <= self.last_attempted {
            return Err(CoreError::InvalidTransition {
                from: self.last_attempted.to_string(),
                to: level.to_string(),
            });
        }
        self.last_attempted = level;
        Ok(())
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    #[must_use]
    pub const fn state(&self) -> &ResolvedLevel {
        &self.state
    }

    #[must_use]
    pub const fn district(&self) -> Option<&ResolvedLevel> {
        self.district.as_ref()
    }

    #[must_use]
    pub const fn block(&self) -> Option<&ResolvedLevel> {
        self.block.as_ref()
    }

    #[must_use]
    pub const fn village(&self) -> Option<&ResolvedLevel> {
        self.village.as_ref()
    }

    #[must_use]
    pub const fn level(&self, level: AdminLevel) -> Option<&ResolvedLevel> {
        match level {
            AdminLevel::State => Some(&self.state),
            AdminLevel::District => self.district.as_ref(),
            AdminLevel::Block => self.block.as_ref(),
            AdminLevel::Village => self.village.as_ref(),
        }
    }

    /// Matched levels, coarsest first.
    pub fn levels(&self) -> impl Iterator<Item = &ResolvedLevel> {
        AdminLevel::ALL.into_iter().filter_map(|l| self.level(l))
    }

    /// The most specific matched level.
    #[must_use]
    pub fn deepest(&self) -> &ResolvedLevel {
        self.levels().last().unwrap_or(&self.state)
    }

    #[must_use]
    pub fn resolution_state(&self) -> ResolutionState {
        ResolutionState::resolved_at(self.deepest().level)
    }

    /// Centroid of the most specific matched level that carried geometry.
    #[must_use]
    pub fn centroid(&self) -> Option<LatLon> {
        self.levels().filter_map(|l| l.centroid).last()
    }

    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Compact view for report output.
    #[must_use]
    pub fn summary(&self) -> AoiSummary {
        let summarize = |l: &ResolvedLevel| LevelSummary {
            name: l.matched_name.clone(),
            code: l.code.clone(),
        };
        let deepest = self.deepest();
        AoiSummary {
            state: summarize(&self.state),
            district: self.district.as_ref().map(summarize),
            block: self.block.as_ref().map(summarize),
            village: self.village.as_ref().map(summarize),
            resolved_level: deepest.level,
            source_layer: deepest.source_layer.clone(),
            centroid: self.centroid(),
        }
    }
}

/// Name and code of one matched level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LevelSummary {
    pub name: String,
    pub code: Option<String>,
}

/// Report-facing summary of an [`AoiContext`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AoiSummary {
    pub state: LevelSummary,
    pub district: Option<LevelSummary>,
    pub block: Option<LevelSummary>,
    pub village: Option<LevelSummary>,
    pub resolved_level: AdminLevel,
    pub source_layer: String,
    pub centroid: Option<LatLon>,
}
