//! HTTP transport seam.
//!
//! [`Access`](crate::Access) never talks to the network directly. It builds an
//! [`ApiRequest`] and hands it to a [`Transport`] together with a
//! [`RequestDecorator`]; the transport applies the decorator exactly once to
//! the outgoing headers and returns the parsed JSON body.
//!
//! [`ReqwestTransport`] is the production implementation.

mod client;
pub mod error;

pub use client::{DEFAULT_TIMEOUT_SECS, ReqwestTransport, ReqwestTransportBuilder};
pub use error::{Error, Result, instance_error};

use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use url::Url;

/// Header carrying the current session token.
pub const SESSION_TOKEN_HEADER: &str = "access-sessiontoken";

/// A JSON request against the access server.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Headers set before decoration.
    pub headers: HeaderMap,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create a `GET` request.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Create a `POST` request with a JSON body.
    #[must_use]
    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }
}

/// Hook applied to every outgoing request.
pub trait RequestDecorator: Send + Sync {
    /// Adds or rewrites headers on a request about to be sent.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value cannot be encoded.
    fn decorate(&self, headers: &mut HeaderMap) -> Result<()>;
}

/// Decorator that adds [`SESSION_TOKEN_HEADER`] once a token is known.
#[derive(Debug, Clone, Copy)]
pub struct SessionTokenHeader<'a> {
    token: &'a str,
}

impl<'a> SessionTokenHeader<'a> {
    /// Decorates requests with `token`; an empty token adds nothing.
    #[must_use]
    pub const fn new(token: &'a str) -> Self {
        Self { token }
    }
}

impl RequestDecorator for SessionTokenHeader<'_> {
    fn decorate(&self, headers: &mut HeaderMap) -> Result<()> {
        if self.token.is_empty() {
            return Ok(());
        }

        let mut value = HeaderValue::from_str(self.token)?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(SESSION_TOKEN_HEADER), value);
        Ok(())
    }
}

/// Capability to send JSON requests to the access server.
#[async_trait]
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement the `Transport` trait",
    label = "this type cannot send requests to an access server",
    note = "implement `Transport` or use `ReqwestTransport`"
)]
pub trait Transport: Send + Sync {
    /// Sends `request` after applying `decorator` to its headers once.
    ///
    /// Returns the response body parsed as JSON. Non-success statuses are
    /// errors.
    async fn send(&self, request: ApiRequest, decorator: &dyn RequestDecorator) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_header_skips_empty_token() {
        let mut headers = HeaderMap::new();
        SessionTokenHeader::new("").decorate(&mut headers).unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_session_header_sets_token() {
        let mut headers = HeaderMap::new();
        SessionTokenHeader::new("t-123")
            .decorate(&mut headers)
            .unwrap();

        let value = headers.get(SESSION_TOKEN_HEADER).unwrap();
        assert_eq!(value.to_str().unwrap(), "t-123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_session_header_rejects_control_characters() {
        let mut headers = HeaderMap::new();
        let err = SessionTokenHeader::new("bad\ntoken")
            .decorate(&mut headers)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(_)));
    }

    #[test]
    fn test_api_request_constructors() {
        let url = Url::parse("http://access/sessions").unwrap();
        let get = ApiRequest::get(url.clone());
        assert_eq!(get.method, Method::GET);
        assert!(get.body.is_none());

        let post = ApiRequest::post(url, serde_json::json!({ "a": 1 }));
        assert_eq!(post.method, Method::POST);
        assert_eq!(post.body, Some(serde_json::json!({ "a": 1 })));
    }
}
