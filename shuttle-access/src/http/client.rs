//! `reqwest`-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{ApiRequest, Error, RequestDecorator, Result, Transport, instance_error};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// [`Transport`] over a shared [`reqwest::Client`].
///
/// # Example
///
/// ```rust,ignore
/// use shuttle_access::http::ReqwestTransport;
///
/// let transport = ReqwestTransport::builder()
///     .timeout_secs(10)
///     .user_agent("my-app/1.0")
///     .build()?;
/// ```
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Wrap an already configured client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Turn an [`ApiRequest`] into a `reqwest` request, decorating it once.
    fn build_request(
        &self,
        request: ApiRequest,
        decorator: &dyn RequestDecorator,
    ) -> Result<reqwest::Request> {
        let ApiRequest {
            method,
            url,
            mut headers,
            body,
        } = request;
        decorator.decorate(&mut headers)?;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        builder.build().map_err(instance_error)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest, decorator: &dyn RequestDecorator) -> Result<Value> {
        let request = self.build_request(request, decorator)?;
        debug!(method = %request.method(), url = %request.url(), "sending request");

        let response = self.client.execute(request).await.map_err(instance_error)?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(%status, "request failed");
            return Err(if message.is_empty() {
                Error::InvalidStatusCode(status)
            } else {
                Error::InvalidStatusCodeWithMessage(status, message)
            });
        }

        let bytes = response.bytes().await.map_err(instance_error)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl ReqwestTransportBuilder {
    /// Set the request timeout in seconds.
    ///
    /// Defaults to [`DEFAULT_TIMEOUT_SECS`].
    #[must_use]
    pub const fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    /// Set the user agent sent with every request.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn build(self) -> Result<ReqwestTransport> {
        let timeout = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(timeout));

        if let Some(ref user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder.build().map_err(instance_error)?;
        Ok(ReqwestTransport { client })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{SESSION_TOKEN_HEADER, SessionTokenHeader};
    use url::Url;

    #[test]
    fn test_build_request_applies_decorator() {
        let transport = ReqwestTransport::from_client(reqwest::Client::new());
        let url = Url::parse("http://access/permissions/anonymous").unwrap();

        let request = transport
            .build_request(ApiRequest::get(url), &SessionTokenHeader::new("abc"))
            .unwrap();

        assert_eq!(request.method(), &reqwest::Method::GET);
        assert_eq!(request.url().path(), "/permissions/anonymous");
        assert_eq!(request.headers()[SESSION_TOKEN_HEADER], "abc");
        assert!(request.body().is_none());
    }

    #[test]
    fn test_build_request_serializes_json_body() {
        let transport = ReqwestTransport::from_client(reqwest::Client::new());
        let url = Url::parse("http://access/sessions").unwrap();
        let body = serde_json::json!({ "identityName": "u", "password": "p" });

        let request = transport
            .build_request(ApiRequest::post(url, body.clone()), &SessionTokenHeader::new(""))
            .unwrap();

        assert!(request.headers().get(SESSION_TOKEN_HEADER).is_none());
        let bytes = request.body().and_then(reqwest::Body::as_bytes).unwrap();
        let sent: Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(sent, body);
    }

    #[test]
    fn test_builder_defaults() {
        let transport = ReqwestTransport::builder()
            .timeout_secs(5)
            .user_agent("shuttle-access-test")
            .build();
        assert!(transport.is_ok());
    }
}
