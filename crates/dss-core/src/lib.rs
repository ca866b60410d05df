//! # dss-core
//!
//! Core types, geo helpers, and error types for the DSS report pipeline.
//!
//! This crate provides the foundational types shared across all DSS crates:
//! - Layer descriptors with typed semantic role bindings
//! - Administrative levels and the resolution state machine
//! - Query filters rendered as `WHERE` expressions
//! - The resolved AOI context and its report summary
//! - Indicator values, bundles, and recommendations
//! - Report envelope types
//! - Great-circle distance and centroid math
//! - The state full-name / abbreviation table

pub mod aoi;
pub mod enums;
pub mod errors;
pub mod filter;
pub mod geo;
pub mod indicators;
pub mod layer;
pub mod recommendation;
pub mod report;
pub mod states;
