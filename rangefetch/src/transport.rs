//! HTTP transport abstraction for testability.
//!
//! The probe and the range fetcher never talk to a global client. They are
//! handed an [`HttpTransport`], a single `execute(request) -> response`
//! capability, so tests can substitute an in-memory server.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};
use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Readable response body. Dropping it releases the underlying stream.
pub type Body = Box<dyn Read + Send>;

/// Errors raised by a transport before a response is available.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// A header value could not be encoded.
    #[error("invalid value for header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The request could not be sent or no response arrived.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },
}

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

impl HttpRequest {
    /// Creates a request with no headers.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::HEAD, url)
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Sets a header, replacing any previous value.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self, TransportError> {
        self.set_header(name, value)?;
        Ok(self)
    }

    /// Sets a header in place, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), TransportError> {
        let value = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Returns a header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A response as handed back by a transport.
///
/// Keeps the request that produced it so callers can recover request-side
/// information (such as the `Range` header) after responses were reordered.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
    pub request: HttpRequest,
}

impl HttpResponse {
    /// Returns a header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Declared `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header(&CONTENT_LENGTH)
            .and_then(|s| s.trim().parse::<u64>().ok())
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP transport operations.
///
/// Implementations must be shareable across threads; the parallel fetch
/// strategy issues requests from several workers at once.
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns the response with its body unread.
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Real HTTP transport using a blocking reqwest client.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        Self::build(timeout, None)
    }

    /// Creates a transport with a custom timeout and `User-Agent`.
    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        Self::build(timeout, Some(user_agent))
    }

    fn build(timeout: Duration, user_agent: Option<&str>) -> Result<Self, TransportError> {
        let mut builder = reqwest::blocking::Client::builder().timeout(timeout);
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent.to_string());
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout {
                        url: request.url.clone(),
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    TransportError::Request {
                        url: request.url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        Ok(HttpResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: Box::new(response),
            request,
        })
    }
}
