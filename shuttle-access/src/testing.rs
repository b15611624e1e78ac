//! Test doubles for code built on [`Access`](crate::Access).
//!
//! [`MockTransport`] answers requests from a queue of scripted replies and
//! records every request it receives, after decoration, so tests can assert on
//! URLs, bodies and the session header.
//!
//! Available with the `testing` feature.
//!
//! ```rust,ignore
//! use serde_json::json;
//! use shuttle_access::testing::MockTransport;
//!
//! let transport = MockTransport::new();
//! transport.reply(json!({ "identityRequired": false, "permissions": [] }));
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::http::{self as http_client, ApiRequest, RequestDecorator, Transport};

/// A request as seen by [`MockTransport`], after decoration.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URL.
    pub url: Url,
    /// Headers after the decorator ran.
    pub headers: HeaderMap,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// Value of header `name`, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug)]
enum Reply {
    Json(Value),
    Status(StatusCode),
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<Reply>,
    requests: Vec<RecordedRequest>,
}

/// Scripted [`Transport`].
///
/// Clones share the same queue and request log, so a test can keep a handle
/// after giving one to [`Access`](crate::Access).
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a successful JSON reply.
    pub fn reply(&self, body: Value) -> &Self {
        self.lock().replies.push_back(Reply::Json(body));
        self
    }

    /// Queue a failing reply with `status`.
    pub fn fail(&self, status: StatusCode) -> &Self {
        self.lock().replies.push_back(Reply::Status(status));
        self
    }

    /// All requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Number of scripted replies not yet consumed.
    #[must_use]
    pub fn pending_replies(&self) -> usize {
        self.lock().replies.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: ApiRequest,
        decorator: &dyn RequestDecorator,
    ) -> http_client::Result<Value> {
        let ApiRequest {
            method,
            url,
            mut headers,
            body,
        } = request;
        decorator.decorate(&mut headers)?;

        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            method,
            url,
            headers,
            body,
        });

        match state.replies.pop_front() {
            Some(Reply::Json(body)) => Ok(body),
            Some(Reply::Status(status)) => Err(http_client::Error::InvalidStatusCode(status)),
            None => Err(http_client::Error::InvalidStatusCodeWithMessage(
                StatusCode::NOT_IMPLEMENTED,
                "no scripted reply".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::SessionTokenHeader;
    use serde_json::json;

    #[tokio::test]
    async fn test_replies_in_order_and_records() {
        let transport = MockTransport::new();
        transport.reply(json!({ "n": 1 })).fail(StatusCode::UNAUTHORIZED);

        let url = Url::parse("http://access/x").unwrap();
        let first = transport
            .send(ApiRequest::get(url.clone()), &SessionTokenHeader::new("t"))
            .await
            .unwrap();
        assert_eq!(first, json!({ "n": 1 }));

        let second = transport
            .send(ApiRequest::get(url.clone()), &SessionTokenHeader::new(""))
            .await;
        assert!(matches!(
            second,
            Err(http_client::Error::InvalidStatusCode(status)) if status == StatusCode::UNAUTHORIZED
        ));

        let third = transport
            .send(ApiRequest::get(url), &SessionTokenHeader::new(""))
            .await;
        assert!(third.is_err());

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].header(crate::http::SESSION_TOKEN_HEADER), Some("t"));
        assert_eq!(requests[1].header(crate::http::SESSION_TOKEN_HEADER), None);
    }
}
