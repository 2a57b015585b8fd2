//! The single HTTP entry point used by every API call.
//!
//! [`HttpGateway`] runs each request through the pure [`prepare`] and
//! [`classify`] stages and performs at most one refresh-and-replay per call.
//! Token writes are delegated to [`SessionCore`], never done here.

mod pipeline;

pub use self::pipeline::{EndpointPolicy, Verdict, classify, prepare, status_error};

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{AbortHandle, Abortable};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::ports::{ApiRequest, ApiResponse, HttpTransport};
use crate::domain::session::SessionCore;
use crate::domain::{Error, TraceId};

/// HTTP client wrapper implementing the refresh-and-retry protocol.
#[derive(Clone)]
pub struct HttpGateway {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionCore>,
}

impl HttpGateway {
    pub fn new(transport: Arc<dyn HttpTransport>, session: Arc<SessionCore>) -> Self {
        Self { transport, session }
    }

    /// Send a request and return the successful response.
    ///
    /// The call runs in a [`TraceId`] scope (the caller's, or a fresh one)
    /// and the replay after a refresh reuses it.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let trace_id = request
            .trace_id()
            .or_else(TraceId::current)
            .unwrap_or_else(TraceId::generate);
        TraceId::scope(trace_id, self.run(request.with_trace_id(trace_id))).await
    }

    /// Send a request and decode the JSON response body.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        self.execute(request).await?.json()
    }

    /// Send a request whose response body is irrelevant.
    pub async fn execute_unit(&self, request: ApiRequest) -> Result<(), Error> {
        self.execute(request).await.map(drop)
    }

    /// Wrap [`HttpGateway::execute`] so the caller can abandon it, for
    /// example when a page unmounts.
    ///
    /// Aborting resolves the call with [`crate::domain::ErrorCode::Cancelled`]
    /// and drops any refresh it was waiting on; a refresh nobody awaits any
    /// more is abandoned and writes nothing.
    pub fn abortable(
        &self,
        request: ApiRequest,
    ) -> (impl Future<Output = Result<ApiResponse, Error>> + Send + '_, AbortHandle) {
        let (handle, registration) = AbortHandle::new_pair();
        let call = Abortable::new(self.execute(request), registration);
        let call = async move {
            match call.await {
                Ok(result) => result,
                Err(_aborted) => Err(Error::cancelled("request was cancelled")),
            }
        };
        (call, handle)
    }

    async fn run(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let request = prepare(request, self.session.access_token());
        let response = self.transport.send(&request).await?;
        debug!(
            method = request.method().as_str(),
            route = request.route(),
            status = response.status,
            "api response"
        );
        let original_error = match classify(&request, response) {
            Verdict::Deliver(response) => return Ok(response),
            Verdict::Fail(error) => return Err(error),
            Verdict::Refresh(error) => error,
        };

        debug!(route = request.route(), "access token rejected; refreshing");
        let token = match self.session.refresh_access_token(request.bearer()).await {
            Ok(token) => token,
            Err(refresh_error) => {
                debug!(code = ?refresh_error.code(), "refresh failed; surfacing original error");
                return Err(original_error);
            }
        };

        let replay = request.into_replay(token);
        let response = self.transport.send(&replay).await?;
        debug!(route = replay.route(), status = response.status, "replayed request");
        match classify(&replay, response) {
            Verdict::Deliver(response) => Ok(response),
            Verdict::Fail(error) | Verdict::Refresh(error) => Err(error),
        }
    }
}
