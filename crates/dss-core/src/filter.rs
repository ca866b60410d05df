//! Attribute filters rendered as feature-service `WHERE` expressions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a clause compares the attribute to the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `UPPER(field) = UPPER('value')`, for names and other text.
    CaseInsensitive,
    /// `field = 'value'`, for codes.
    Exact,
}

/// One `field = value` equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub value: String,
    pub comparison: Comparison,
}

impl FilterClause {
    fn render(&self) -> String {
        let value = escape(&self.value);
        match self.comparison {
            Comparison::CaseInsensitive => format!("UPPER({}) = UPPER('{value}')", self.field),
            Comparison::Exact => format!("{} = '{value}'", self.field),
        }
    }
}

/// A conjunction of equality clauses. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    clauses: Vec<FilterClause>,
}

impl QueryFilter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Add a case-insensitive text clause.
    #[must_use]
    pub fn text(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(field, value, Comparison::CaseInsensitive);
        self
    }

    /// Add an exact-match clause.
    #[must_use]
    pub fn exact(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(field, value, Comparison::Exact);
        self
    }

    pub fn push(
        &mut self,
        field: impl Into<String>,
        value: impl Into<String>,
        comparison: Comparison,
    ) {
        self.clauses.push(FilterClause {
            field: field.into(),
            value: value.into(),
            comparison,
        });
    }

    #[must_use]
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render as a `WHERE` expression (`1=1` when empty).
    #[must_use]
    pub fn to_where(&self) -> String {
        if self.clauses.is_empty() {
            return "1=1".to_string();
        }
        self.clauses
            .iter()
            .map(FilterClause::render)
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_where())
    }
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}
