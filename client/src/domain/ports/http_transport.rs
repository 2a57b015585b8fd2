//! Driven port for sending HTTP requests to the portal REST API.
//!
//! The domain owns the request and response shapes. Requests are immutable
//! values: every pipeline stage returns a new request instead of mutating a
//! shared client, and each request carries its own retry metadata.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::define_port_error;
use crate::domain::{AccessToken, Error, TraceId};

/// HTTP method subset used by the portal API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Per-request protocol metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestMeta {
    /// Set once the request has been replayed after a token refresh.
    pub retried: bool,
}

/// One request to the API, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    bearer: Option<AccessToken>,
    trace_id: Option<TraceId>,
    meta: RequestMeta,
}

impl ApiRequest {
    /// Build a request without a body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
            trace_id: None,
            meta: RequestMeta::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Return a copy carrying `Authorization: Bearer <token>`.
    #[must_use]
    pub fn with_bearer(mut self, token: AccessToken) -> Self {
        self.bearer = Some(token);
        self
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Return the one permitted replay of this request, carrying a fresh
    /// access token and the `retried` flag.
    #[must_use]
    pub fn into_replay(mut self, token: AccessToken) -> Self {
        self.bearer = Some(token);
        self.meta.retried = true;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path including any query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path with the query string and fragment removed.
    pub fn route(&self) -> &str {
        self.path
            .split(['?', '#'])
            .next()
            .unwrap_or(self.path.as_str())
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn bearer(&self) -> Option<&AccessToken> {
        self.bearer.as_ref()
    }

    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    pub fn meta(&self) -> RequestMeta {
        self.meta
    }
}

/// Raw response as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Build a response with a JSON body.
    pub fn json_body(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|error| {
            Error::server(format!("unexpected response payload: {error}"))
        })
    }
}

define_port_error! {
    /// Failures that happen before any HTTP response is received.
    pub enum TransportError {
        /// Connection, DNS, or TLS failure.
        Transport { message: String } =>
            "api transport failed: {message}",
        /// The bounded request timeout elapsed.
        Timeout { message: String } =>
            "api request timed out: {message}",
    }
}

impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Transport { .. } => Error::network(value.to_string()),
            TransportError::Timeout { .. } => Error::timeout(value.to_string()),
        }
    }
}

/// Port for executing one HTTP exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request exactly as given and return whatever status came back.
    ///
    /// Non-2xx statuses are responses, not errors; only failures without a
    /// response are reported as [`TransportError`].
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
