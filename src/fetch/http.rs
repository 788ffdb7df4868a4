//! HTTP plumbing for upstream services.
//!
//! Fetchers talk to upstreams through [`HttpTransport`] so tests can swap the
//! network for a mock. [`ReqwestTransport`] is the production implementation.

use crate::config::USER_AGENT;
use crate::error::RelayError;
use crate::utils::truncate_str;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;
use tracing::error;

/// Raw upstream answer: status and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpReply {
    /// A 200 reply carrying `body` serialized as JSON.
    #[must_use]
    pub fn json(body: &Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }
}

/// Async HTTP client used by the fetchers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Timeout` or `RelayError::Network` on transport failure.
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply, RelayError>;

    /// Issues a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Timeout` or `RelayError::Network` on transport failure.
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<HttpReply, RelayError>;
}

/// [`HttpTransport`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: HttpClient,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Creates a client sending the fixed browser User-Agent.
    #[must_use]
    pub fn new() -> Self {
        let client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self { client }
    }

    async fn finish(
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<HttpReply, RelayError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_transport_error)?;
        Ok(HttpReply { status, body })
    }
}

fn map_transport_error(e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::Timeout
    } else {
        RelayError::Network(e.to_string())
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply, RelayError> {
        Self::finish(self.client.get(url), timeout).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<HttpReply, RelayError> {
        Self::finish(self.client.post(url).json(body), timeout).await
    }
}

/// Checks the status and parses the body as JSON.
///
/// # Errors
///
/// Returns `RelayError::Status` for anything but 200 and
/// `RelayError::InvalidJson` when the body does not parse.
pub fn decode_reply(service: &str, reply: &HttpReply) -> Result<Value, RelayError> {
    if reply.status != 200 {
        error!(
            "[{service}] upstream returned {}: {}",
            reply.status,
            truncate_str(&reply.body, 200)
        );
        return Err(RelayError::Status(reply.status));
    }

    serde_json::from_str(&reply.body).map_err(|e| {
        error!("[{service}] JSON parse error: {e}");
        RelayError::InvalidJson(e.to_string())
    })
}

/// Percent-encodes a target URL for use as a query value (`+` for spaces).
#[must_use]
pub fn encode_query_value(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_ok() {
        let reply = HttpReply::json(&json!({"a": 1}));
        assert_eq!(decode_reply("svc", &reply), Ok(json!({"a": 1})));
    }

    #[test]
    fn test_decode_status() {
        let reply = HttpReply {
            status: 503,
            body: "<html>down</html>".to_string(),
        };
        assert_eq!(decode_reply("svc", &reply), Err(RelayError::Status(503)));
    }

    #[test]
    fn test_decode_not_json() {
        let reply = HttpReply {
            status: 200,
            body: "<html>ok</html>".to_string(),
        };
        assert!(matches!(
            decode_reply("svc", &reply),
            Err(RelayError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_encode_query_value() {
        assert_eq!(
            encode_query_value("https://a.b/c d?x=1&y=2"),
            "https%3A%2F%2Fa.b%2Fc+d%3Fx%3D1%26y%3D2"
        );
    }
}
