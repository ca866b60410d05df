//! Scripted in-memory transport for tests.
//!
//! A [`ScriptedTransport`] answers every request through a handler closure and
//! records what was sent, so tests can assert on both outcomes and traffic.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::error::TransportError;
use crate::transport::{FeatureTransport, RawResponse, TransportRequest};

/// A scripted answer, optionally delivered after a delay.
#[derive(Debug, Clone)]
pub struct Reply {
    pub delay: Duration,
    pub result: Result<RawResponse, TransportError>,
}

impl Reply {
    /// HTTP 200 with a JSON body.
    #[must_use]
    pub fn json(body: &Value) -> Self {
        Self::raw(RawResponse::new(200, body.to_string()))
    }

    /// HTTP 200 with a page of features built from attribute maps.
    #[must_use]
    pub fn features(attributes: &[Value], exceeded_transfer_limit: Option<bool>) -> Self {
        let features: Vec<Value> = attributes
            .iter()
            .map(|a| serde_json::json!({"attributes": a}))
            .collect();
        let mut body = serde_json::json!({"features": features});
        if let Some(exceeded) = exceeded_transfer_limit {
            body["exceededTransferLimit"] = Value::Bool(exceeded);
        }
        Self::json(&body)
    }

    /// An empty, final page.
    #[must_use]
    pub fn empty() -> Self {
        Self::json(&serde_json::json!({"features": []}))
    }

    /// A bare status code with an empty body.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::raw(RawResponse::new(status, ""))
    }

    /// HTTP 200 carrying an embedded `{"error": ...}` envelope.
    #[must_use]
    pub fn service_error(code: u16, message: &str) -> Self {
        Self::json(&serde_json::json!({"error": {"code": code, "message": message}}))
    }

    #[must_use]
    pub fn network(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(TransportError::Network(message.to_string())),
        }
    }

    #[must_use]
    pub const fn raw(response: RawResponse) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(response),
        }
    }

    /// Deliver this reply after `delay`.
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Handler = Box<dyn Fn(&TransportRequest) -> Reply + Send + Sync>;

/// [`FeatureTransport`] driven by a closure.
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    /// Answer each request with `handler(request)`.
    pub fn new(handler: impl Fn(&TransportRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer requests with `replies` in order; once exhausted every request
    /// gets a network error.
    #[must_use]
    pub fn sequence(replies: impl IntoIterator<Item = Reply>) -> Self {
        let queue = Mutex::new(replies.into_iter().collect::<VecDeque<_>>());
        Self::new(move |_| {
            queue
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or_else(|| Reply::network("script exhausted"))
        })
    }

    /// Every request sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Requests sent to URLs containing `fragment`.
    #[must_use]
    pub fn requests_to(&self, fragment: &str) -> Vec<TransportRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(fragment))
            .collect()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl FeatureTransport for ScriptedTransport {
    fn send(
        &self,
        request: &TransportRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }
        let reply = (self.handler)(request);
        async move {
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            reply.result
        }
    }
}
