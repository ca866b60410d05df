//! # dss-arcgis
//!
//! Feature service query client.
//!
//! Turns a `(LayerSpec, FeatureQuery)` pair into page fetches against the
//! layer's `query` endpoint and returns a flattened, de-duplicated
//! [`FeatureSet`], or a typed [`QueryError`]:
//!
//! - HTTP 429/5xx, network failures, and embedded error bodies with such codes
//!   are retried with exponential backoff up to the attempt budget, then
//!   reported as [`QueryError::Transient`].
//! - Other 4xx statuses, embedded 4xx error codes, malformed bodies, and
//!   spatial queries against the wrong geometry kind are reported as
//!   [`QueryError::Client`] and never retried.
//!
//! Network I/O goes through the [`FeatureTransport`] trait; [`HttpTransport`]
//! is the `reqwest` implementation.

mod error;
mod feature;
mod query;
mod retry;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{QueryError, TransportError};
pub use feature::{Feature, FeatureSet};
pub use query::{FeatureQuery, QueryKind};
pub use retry::{PagingPolicy, RetryPolicy};
pub use transport::{FeatureTransport, HttpTransport, RawResponse, TransportRequest};

use std::collections::HashSet;
use std::time::Duration;

use dss_config::ArcgisConfig;
use dss_core::layer::LayerSpec;

use crate::feature::{ErrorBody, QueryPage};

/// Outcome of one attempt at fetching a page.
enum Attempt {
    Page(QueryPage),
    Retry {
        message: String,
        retry_after: Option<Duration>,
    },
    Fail {
        status: Option<u16>,
        message: String,
    },
}

/// Query client over a [`FeatureTransport`].
pub struct FeatureClient<T = HttpTransport> {
    transport: T,
    retry: RetryPolicy,
    paging: PagingPolicy,
    token: Option<String>,
}

impl FeatureClient<HttpTransport> {
    /// HTTP client configured from the `[arcgis]` section.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error if the HTTP client cannot be built.
    pub fn from_config(config: &ArcgisConfig) -> Result<Self, reqwest::Error> {
        let transport = HttpTransport::new(config.timeout(), &config.user_agent)?;
        Ok(Self::new(transport)
            .with_retry(RetryPolicy::from_config(config))
            .with_paging(PagingPolicy::from_config(config))
            .with_token(config.token().map(str::to_string)))
    }
}

impl<T: FeatureTransport> FeatureClient<T> {
    /// Client with default retry and paging policies and no token.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            paging: PagingPolicy::default(),
            token: None,
        }
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn with_paging(mut self, paging: PagingPolicy) -> Self {
        self.paging = paging;
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Run `query` against `layer`, following pages until the service reports
    /// no more data, a page comes back empty, or the page cap is hit.
    ///
    /// Near-point queries fetch every feature within the radius and return
    /// the `limit` closest to the query point.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Client`] for non-retryable failures and
    /// [`QueryError::Transient`] once the retry budget is spent on any page.
    pub async fn query(
        &self,
        layer: &LayerSpec,
        query: &FeatureQuery,
    ) -> Result<FeatureSet, QueryError> {
        if let Some(message) = query.geometry_mismatch(layer) {
            return Err(QueryError::Client {
                layer: layer.name.clone(),
                status: None,
                message,
                query: query.to_string(),
            });
        }

        let url = layer.query_url();
        let page_size = self.paging.page_size.max(1);
        let id_field = layer.id_field.as_deref();

        let mut set = FeatureSet::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut offset = 0usize;

        loop {
            if set.pages >= self.paging.max_pages {
                tracing::warn!(
                    layer = %layer.name,
                    pages = set.pages,
                    features = set.features.len(),
                    "page cap reached; result truncated"
                );
                set.truncated = true;
                break;
            }

            let request = TransportRequest {
                url: url.clone(),
                params: query.params(layer, offset, page_size, self.token.as_deref()),
            };
            tracing::debug!(layer = %layer.name, %query, offset, "querying page");
            let page = self.fetch_page(layer, query, &request).await?;
            set.pages += 1;

            let received = page.features.len();
            for feature in page.features {
                match feature.identity(id_field) {
                    Some(id) => {
                        if seen.insert(id) {
                            set.features.push(feature);
                        }
                    }
                    None => set.features.push(feature),
                }
            }

            let more = page
                .exceeded_transfer_limit
                .unwrap_or(received >= page_size as usize);
            if received == 0 || !more {
                break;
            }
            offset += received;
        }

        // services return features in storage order, so the limit applies
        // only after ranking everything within the radius
        if let QueryKind::NearPoint { point, limit, .. } = query.kind {
            set.keep_nearest(point, limit as usize);
        }

        tracing::debug!(
            layer = %layer.name,
            features = set.features.len(),
            pages = set.pages,
            "query complete"
        );
        Ok(set)
    }

    async fn fetch_page(
        &self,
        layer: &LayerSpec,
        query: &FeatureQuery,
        request: &TransportRequest,
    ) -> Result<QueryPage, QueryError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_message = String::new();

        for attempt in 1..=max_attempts {
            let outcome = match self.transport.send(request).await {
                Ok(response) => classify(&response),
                Err(err) => Attempt::Retry {
                    message: err.to_string(),
                    retry_after: None,
                },
            };

            match outcome {
                Attempt::Page(page) => return Ok(page),
                Attempt::Fail { status, message } => {
                    tracing::warn!(layer = %layer.name, ?status, %message, "query rejected");
                    return Err(QueryError::Client {
                        layer: layer.name.clone(),
                        status,
                        message,
                        query: query.to_string(),
                    });
                }
                Attempt::Retry {
                    message,
                    retry_after,
                } => {
                    if attempt < max_attempts {
                        let delay = self.retry.delay(attempt, retry_after);
                        tracing::warn!(
                            layer = %layer.name,
                            attempt,
                            max_attempts,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            %message,
                            "transient query failure; retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_message = message;
                }
            }
        }

        Err(QueryError::Transient {
            layer: layer.name.clone(),
            attempts: max_attempts,
            message: last_message,
        })
    }
}

const fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

fn classify(response: &RawResponse) -> Attempt {
    let status = response.status;
    if is_retryable_status(status) {
        return Attempt::Retry {
            message: format!("HTTP {status}"),
            retry_after: response.retry_after.map(Duration::from_secs),
        };
    }
    if !(200..300).contains(&status) {
        return Attempt::Fail {
            status: Some(status),
            message: format!("HTTP {status}: {}", snippet(&response.body)),
        };
    }

    let value: serde_json::Value = match serde_json::from_str(&response.body) {
        Ok(v) => v,
        Err(e) => {
            return Attempt::Fail {
                status: Some(status),
                message: format!("malformed response body: {e}"),
            };
        }
    };

    if let Some(error) = value.get("error") {
        let body: ErrorBody = serde_json::from_value(error.clone()).unwrap_or(ErrorBody {
            code: None,
            message: Some(error.to_string()),
            details: Vec::new(),
        });
        return match body.code {
            Some(code) if is_retryable_status(code) => Attempt::Retry {
                message: format!("service error {code}: {}", body.describe()),
                retry_after: response.retry_after.map(Duration::from_secs),
            },
            code => Attempt::Fail {
                status: code,
                message: body.describe(),
            },
        };
    }

    match serde_json::from_value::<QueryPage>(value) {
        Ok(page) => Attempt::Page(page),
        Err(e) => Attempt::Fail {
            status: Some(status),
            message: format!("unexpected response shape: {e}"),
        },
    }
}

fn snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(i, _)| i);
    body[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_statuses() {
        assert!(matches!(
            classify(&RawResponse::new(503, "")),
            Attempt::Retry { .. }
        ));
        assert!(matches!(
            classify(&RawResponse::new(429, "").with_retry_after(7)),
            Attempt::Retry {
                retry_after: Some(d),
                ..
            } if d == Duration::from_secs(7)
        ));
        assert!(matches!(
            classify(&RawResponse::new(404, "not found")),
            Attempt::Fail {
                status: Some(404),
                ..
            }
        ));
    }

    #[test]
    fn classify_embedded_errors() {
        let body = r#"{"error":{"code":400,"message":"Invalid query","details":[]}}"#;
        assert!(matches!(
            classify(&RawResponse::new(200, body)),
            Attempt::Fail {
                status: Some(400),
                ..
            }
        ));
        let body = r#"{"error":{"code":504,"message":"Gateway timeout"}}"#;
        assert!(matches!(
            classify(&RawResponse::new(200, body)),
            Attempt::Retry { .. }
        ));
    }

    #[test]
    fn classify_malformed_body_is_not_retried() {
        match classify(&RawResponse::new(200, "<html>maintenance</html>")) {
            Attempt::Fail { status, message } => {
                assert_eq!(status, Some(200));
                assert!(message.starts_with("malformed response body"));
            }
            _ => panic!("expected a client failure"),
        }
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        assert_eq!(snippet(&long).chars().count(), 200);
        assert_eq!(snippet("  short "), "short");
    }
}
