//! [`TokenRefresher`] adapter posting to `/auth/refresh`.
//!
//! Refresh traffic goes straight to the transport: it never carries a bearer
//! and a 401 from it must end the session rather than start another refresh.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::dto::{RefreshResponseDto, RefreshTokenBody, to_json};
use crate::domain::gateway::status_error;
use crate::domain::ports::{ApiRequest, HttpTransport, TokenRefresher};
use crate::domain::{Error, RefreshGrant, RefreshToken, TraceId};

const REFRESH: &str = "/auth/refresh";

/// HTTP implementation of the refresh-token exchange.
#[derive(Clone)]
pub struct HttpTokenRefresher {
    transport: Arc<dyn HttpTransport>,
}

impl HttpTokenRefresher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshGrant, Error> {
        let body = to_json(&RefreshTokenBody::new(Some(refresh_token)))?;
        let mut request = ApiRequest::post(REFRESH, body);
        if let Some(trace_id) = TraceId::current() {
            request = request.with_trace_id(trace_id);
        }
        let response = self.transport.send(&request).await?;
        debug!(status = response.status, "refresh response");
        if !response.is_success() {
            return Err(status_error(&response));
        }
        response.json::<RefreshResponseDto>()?.into_grant()
    }
}

#[cfg(test)]
mod tests {
    //! Refresh exchange coverage.

    use mockall::predicate::always;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{ApiResponse, MockHttpTransport, TransportError};

    fn token() -> RefreshToken {
        RefreshToken::new("r1").expect("token")
    }

    #[rstest]
    #[tokio::test]
    async fn posts_the_refresh_token_without_a_bearer() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.path() == REFRESH
                    && request.bearer().is_none()
                    && request.body() == Some(&json!({ "refreshToken": "r1" }))
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::json_body(
                    200,
                    &json!({ "accessToken": "a2", "refreshToken": "r2" }),
                ))
            });
        let refresher = HttpTokenRefresher::new(Arc::new(transport));

        let grant = refresher.refresh(&token()).await.expect("refreshed");

        assert_eq!(grant.access.expose(), "a2");
        assert_eq!(grant.refresh.as_ref().map(RefreshToken::expose), Some("r2"));
    }

    #[rstest]
    #[tokio::test]
    async fn keeps_the_caller_trace_id() {
        let trace_id = TraceId::generate();
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(move |request| request.trace_id() == Some(trace_id))
            .times(1)
            .returning(|_| Ok(ApiResponse::json_body(200, &json!({ "accessToken": "a2" }))));
        let refresher = HttpTokenRefresher::new(Arc::new(transport));

        let grant = TraceId::scope(trace_id, refresher.refresh(&token()))
            .await
            .expect("refreshed");

        assert!(grant.refresh.is_none());
    }

    #[rstest]
    #[case(401, ErrorCode::Unauthorized)]
    #[case(500, ErrorCode::ServerError)]
    #[tokio::test]
    async fn rejected_refreshes_map_to_domain_errors(
        #[case] status: u16,
        #[case] expected: ErrorCode,
    ) {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .with(always())
            .times(1)
            .returning(move |_| {
                Ok(ApiResponse::json_body(
                    status,
                    &json!({ "message": "refresh token revoked" }),
                ))
            });
        let refresher = HttpTokenRefresher::new(Arc::new(transport));

        let error = refresher.refresh(&token()).await.expect_err("rejected");

        assert_eq!(error.code(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn transport_failures_surface_as_network_errors() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Err(TransportError::transport("connection refused")));
        let refresher = HttpTokenRefresher::new(Arc::new(transport));

        let error = refresher.refresh(&token()).await.expect_err("offline");

        assert_eq!(error.code(), ErrorCode::NetworkFailure);
    }
}
