//! Reqwest-backed implementation of the [`HttpTransport`] port.
//!
//! This adapter owns transport details only: URL joining, header
//! serialisation, the bounded request timeout, and mapping `reqwest`
//! failures. Status handling belongs to the gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url, header};

use crate::domain::TRACE_ID_HEADER;
use crate::domain::ports::{ApiRequest, ApiResponse, HttpTransport, Method, TransportError};

/// Transport sending requests relative to one API base URL.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Build a transport with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        join_url(&self.base_url, path)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(request.path())?;
        let mut builder = self
            .client
            .request(reqwest_method(request.method()), url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = request.bearer() {
            builder = builder.bearer_auth(token.expose());
        }
        if let Some(trace_id) = request.trace_id() {
            builder = builder.header(TRACE_ID_HEADER, trace_id.to_string());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

/// Append `path` to the base URL, keeping the base's own path prefix.
///
/// `Url::join` would discard a base path such as `/api` for absolute
/// paths, so the two are concatenated instead.
fn join_url(base: &Url, path: &str) -> Result<Url, TransportError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|error| {
        TransportError::transport(format!("invalid request url {joined}: {error}"))
    })
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else {
        TransportError::transport(error.to_string())
    }
}
