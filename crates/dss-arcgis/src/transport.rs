//! The seam between query logic and the network.
//!
//! [`FeatureTransport`] sends one form-encoded request and hands back the raw
//! status and body. Status classification, retry, and pagination live in the
//! client so they can be exercised against an in-memory transport.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};

use crate::error::TransportError;

/// One `POST` to a layer's query endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: String,
    /// Form fields, in the order they are sent.
    pub params: Vec<(String, String)>,
}

impl TransportRequest {
    /// Value of the first form field named `key`.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn form_body(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Status, `Retry-After` seconds, and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub retry_after: Option<u64>,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    #[must_use]
    pub const fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }
}

/// Sends query requests. Implementations must be cheap to share by reference
/// across concurrent fetches.
pub trait FeatureTransport: Send + Sync {
    fn send(
        &self,
        request: &TransportRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// [`FeatureTransport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a client with a per-request timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

impl FeatureTransport for HttpTransport {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        let resp = self
            .http
            .post(&request.url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(request.form_body())
            .send()
            .await?;
        let status = resp.status().as_u16();
        let retry_after = parse_retry_after(&resp);
        let body = resp.text().await?;
        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// `Retry-After` as whole seconds. HTTP-date values are ignored.
fn parse_retry_after(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
