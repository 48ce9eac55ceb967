//! Transport abstraction and the default `reqwest` implementation.

use async_trait::async_trait;
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use simple_auth_core::AuthError;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub use reqwest::Method;

/// An outgoing HTTP request, independent of the transport that sends it.
#[derive(Clone)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: Method,
    /// Request headers, keyed by lowercased name.
    headers: BTreeMap<String, String>,
    /// Raw request body.
    pub body: Option<Vec<u8>>,
    /// Per-attempt timeout enforced by the transport.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Sets a header, replacing any previous value under the same name.
    /// Names compare case-insensitively.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets `name` only if no header of that name is present.
    #[must_use]
    pub fn with_default_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.as_ref().to_ascii_lowercase())
            .or_insert_with(|| value.into());
        self
    }

    /// Sets the body to the JSON encoding of `value`.
    #[must_use]
    pub fn with_json_body(mut self, value: &JsonValue) -> Self {
        self.body = Some(value.to_string().into_bytes());
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a header value, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Iterates over headers as (lowercased name, value) pairs.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

// Headers and body may carry credentials, so only their shape is printed.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A response as seen by the request executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    status_text: String,
    body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// Creates a 200 response with a JSON body.
    #[must_use]
    pub fn json_ok(body: &JsonValue) -> Self {
        Self::new(200, "OK", body.to_string())
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the status reason phrase.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<JsonValue, Report<AuthError>> {
        serde_json::from_slice(&self.body).map_err(|e| {
            AuthError::Decode {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Sends a single HTTP request.
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status, and `AuthError::Network` when no response was
/// received at all.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed.
    async fn send(&self, url: &str, request: HttpRequest)
    -> Result<HttpResponse, Report<AuthError>>;
}

/// The default transport, backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        url: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, Report<AuthError>> {
        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| AuthError::Network {
            reason: e.to_string(),
        })?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.bytes().await.map_err(|e| AuthError::Network {
            reason: e.to_string(),
        })?;

        debug!(status = status.as_u16(), "response received");

        Ok(HttpResponse::new(status.as_u16(), status_text, body.to_vec()))
    }
}
