//! Query error types.

use thiserror::Error;

/// Transport-level failure. Always retryable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Typed outcome of a failed feature query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The request itself is wrong for this layer. Never retried.
    #[error("query against '{layer}' rejected{}: {message} [{query}]", status_suffix(.status))]
    Client {
        layer: String,
        /// HTTP status or embedded error code, when the service sent one.
        status: Option<u16>,
        message: String,
        /// The `WHERE` clause or spatial description that was sent.
        query: String,
    },

    /// The retry budget ran out on transient failures.
    #[error("query against '{layer}' failed after {attempts} attempts: {message}")]
    Transient {
        layer: String,
        attempts: u32,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl QueryError {
    #[must_use]
    pub fn layer(&self) -> &str {
        match self {
            Self::Client { layer, .. } | Self::Transient { layer, .. } => layer,
        }
    }

    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
