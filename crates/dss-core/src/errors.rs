//! Cross-cutting error types for the DSS crates.
//!
//! Query, resolution, and configuration errors live in their own crates.
//! `CoreError` covers invariants enforced by the shared types themselves.

use thiserror::Error;

/// Errors raised while constructing or mutating core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A layer role binding names an attribute the layer does not request.
    #[error("Layer '{layer}': {role} binding '{field}' is not among the requested attributes")]
    UnknownRoleField {
        layer: String,
        role: &'static str,
        field: String,
    },

    /// An AOI level was written out of hierarchy order or overwritten.
    #[error("Invalid resolution transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Data failed validation (schema, format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
