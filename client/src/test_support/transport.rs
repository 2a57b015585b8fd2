//! Scripted HTTP transport for gateway and adapter tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::ports::{ApiRequest, ApiResponse, HttpTransport, TransportError};

type Responder = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// [`HttpTransport`] that answers from a closure and records every request.
pub struct ScriptedTransport {
    responder: Box<Responder>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Answer `200 {"ok": true}` to requests bearing `token` and `401`
    /// otherwise.
    pub fn accepting(token: &'static str) -> Self {
        Self::new(move |request| {
            let authorised = request.bearer().map(|bearer| bearer.expose()) == Some(token);
            Ok(if authorised {
                ApiResponse::json_body(200, &json!({ "ok": true }))
            } else {
                ApiResponse::json_body(401, &json!({ "message": "jwt expired" }))
            })
        })
    }

    /// Answer every request with the same status and JSON body.
    pub fn always(status: u16, body: serde_json::Value) -> Self {
        Self::new(move |_| Ok(ApiResponse::json_body(status, &body)))
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        match self.log.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => panic!("transport log mutex"),
        }
    }

    /// Number of requests sent to `route` (query string ignored).
    pub fn count_for(&self, route: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.route() == route)
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        match self.log.lock() {
            Ok(mut guard) => guard.push(request.clone()),
            Err(_) => panic!("transport log mutex"),
        }
        (self.responder)(request)
    }
}
