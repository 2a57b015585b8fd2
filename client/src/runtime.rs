//! One-shot wiring of the client runtime.
//!
//! [`PortalRuntime`] builds exactly one [`SessionCore`], one
//! [`NotificationCenter`], and the adapters around them. The page layer holds
//! the runtime and passes its services by reference; nothing is global.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use crate::config::PortalSettings;
use crate::domain::ports::{HttpTransport, TokenStore};
use crate::domain::routing::{RouteTable, RouteTableError};
use crate::domain::{HttpGateway, NotificationCenter, SessionCore, SessionManager};
use crate::inbound::RouteGuard;
use crate::outbound::{HttpAuthApi, HttpTokenRefresher, ReqwestTransport, TabTokenStore};

/// Failures while assembling the runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("invalid route table: {0}")]
    RouteTable(#[from] RouteTableError),
}

/// Driven ports the runtime is assembled from.
pub struct RuntimePorts {
    pub transport: Arc<dyn HttpTransport>,
    pub store: Arc<dyn TokenStore>,
    pub clock: Arc<dyn Clock + Send + Sync>,
}

/// Every client service, wired once.
#[derive(Clone)]
pub struct PortalRuntime {
    session: SessionManager,
    gateway: HttpGateway,
    notifications: Arc<NotificationCenter>,
    guard: RouteGuard,
}

impl PortalRuntime {
    /// Wire the production adapters: `reqwest`, tab storage, system clock.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when the base URL does not parse or the HTTP
    /// client cannot be built.
    pub fn from_settings(settings: &PortalSettings) -> Result<Self, RuntimeError> {
        let transport =
            ReqwestTransport::new(settings.api_base_url()?, settings.request_timeout())?;
        Self::with_ports(
            settings,
            RuntimePorts {
                transport: Arc::new(transport),
                store: Arc::new(TabTokenStore::new()),
                clock: Arc::new(DefaultClock),
            },
        )
    }

    /// Wire the runtime around caller-supplied ports.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::RouteTable`] if the portal route table fails
    /// validation.
    pub fn with_ports(
        settings: &PortalSettings,
        ports: RuntimePorts,
    ) -> Result<Self, RuntimeError> {
        let RuntimePorts {
            transport,
            store,
            clock,
        } = ports;
        let notifications = Arc::new(
            NotificationCenter::new(clock)
                .with_default_duration(settings.toast_duration())
                .with_feed_capacity(settings.feed_capacity()),
        );
        let refresher = Arc::new(HttpTokenRefresher::new(Arc::clone(&transport)));
        let core = Arc::new(
            SessionCore::new(store, refresher).with_notifications(Arc::clone(&notifications)),
        );
        let gateway = HttpGateway::new(transport, Arc::clone(&core));
        let api = Arc::new(HttpAuthApi::new(gateway.clone()));
        Ok(Self {
            session: SessionManager::new(core, api),
            gateway,
            notifications,
            guard: RouteGuard::new(RouteTable::portal()?),
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Gateway for page-level API calls.
    pub fn gateway(&self) -> &HttpGateway {
        &self.gateway
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }
}

#[cfg(test)]
mod tests {
    //! End-to-end wiring over a scripted transport.

    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::ports::{ApiRequest, ApiResponse};
    use crate::domain::routing::RouteDecision;
    use crate::domain::session::SESSION_EXPIRED_MESSAGE;
    use crate::test_support::{MutableClock, RecordingTokenStore, ScriptedTransport};

    fn user_json() -> serde_json::Value {
        json!({
            "id": "u-1",
            "role": "customer",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "a@b.com"
        })
    }

    /// Backend whose access tokens are `a1` until refreshed to `a2`; refresh
    /// only succeeds when `refresh_ok`.
    fn backend(refresh_ok: bool) -> ScriptedTransport {
        ScriptedTransport::new(move |request: &ApiRequest| {
            let bearer = request.bearer().map(|token| token.expose().to_owned());
            let response = match request.route() {
                "/auth/login" => ApiResponse::json_body(
                    200,
                    &json!({ "accessToken": "a1", "refreshToken": "r1", "user": user_json() }),
                ),
                "/auth/refresh" if refresh_ok => {
                    ApiResponse::json_body(200, &json!({ "accessToken": "a2" }))
                }
                "/auth/refresh" => {
                    ApiResponse::json_body(401, &json!({ "message": "refresh token revoked" }))
                }
                "/quotes" if bearer.as_deref() == Some("a2") => {
                    ApiResponse::json_body(200, &json!({ "quotes": [] }))
                }
                "/auth/logout" => ApiResponse::json_body(200, &json!({})),
                _ => ApiResponse::json_body(401, &json!({ "message": "jwt expired" })),
            };
            Ok(response)
        })
    }

    struct Wired {
        runtime: PortalRuntime,
        transport: Arc<ScriptedTransport>,
        store: Arc<RecordingTokenStore>,
    }

    fn wire(refresh_ok: bool) -> Wired {
        let transport = Arc::new(backend(refresh_ok));
        let store = Arc::new(RecordingTokenStore::default());
        let clock = Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().expect("valid time"),
        ));
        let runtime = PortalRuntime::with_ports(
            &PortalSettings::default(),
            RuntimePorts {
                transport: transport.clone(),
                store: store.clone(),
                clock,
            },
        )
        .expect("runtime wires");
        Wired {
            runtime,
            transport,
            store,
        }
    }

    #[fixture]
    fn refreshing() -> Wired {
        wire(true)
    }

    #[fixture]
    fn revoked() -> Wired {
        wire(false)
    }

    #[rstest]
    #[tokio::test]
    async fn login_then_guarded_navigation(refreshing: Wired) {
        let session = refreshing.runtime.session();
        session.bootstrap().await;
        session.login("a@b.com", "secret1").await.expect("signed in");

        let decision = refreshing
            .runtime
            .guard()
            .decide(&session.session(), "/dashboard/admin");

        assert_eq!(
            decision,
            RouteDecision::RedirectToDashboard("/dashboard/customer".to_owned())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn expired_access_token_is_refreshed_silently(refreshing: Wired) {
        let runtime = &refreshing.runtime;
        runtime.session().bootstrap().await;
        runtime
            .session()
            .login("a@b.com", "secret1")
            .await
            .expect("signed in");

        let response = runtime
            .gateway()
            .execute(ApiRequest::get("/quotes"))
            .await
            .expect("replayed call succeeds");

        assert_eq!(response.status, 200);
        assert_eq!(refreshing.transport.count_for("/auth/refresh"), 1);
        assert_eq!(refreshing.transport.count_for("/quotes"), 2);
        let tokens = refreshing.store.tokens().expect("still signed in");
        assert_eq!(tokens.access().expose(), "a2");
        assert_eq!(tokens.refresh().expose(), "r1");
    }

    #[rstest]
    #[tokio::test]
    async fn revoked_refresh_signs_out_and_warns(revoked: Wired) {
        let runtime = &revoked.runtime;
        runtime.session().bootstrap().await;
        runtime
            .session()
            .login("a@b.com", "secret1")
            .await
            .expect("signed in");

        let error = runtime
            .gateway()
            .execute(ApiRequest::get("/quotes"))
            .await
            .expect_err("both tokens invalid");

        assert_eq!(error.message(), "jwt expired");
        assert!(revoked.store.tokens().is_none());
        assert!(!runtime.session().session().is_authenticated());
        let warnings: Vec<_> = runtime
            .notifications()
            .transient()
            .into_iter()
            .map(|item| item.message().to_owned())
            .collect();
        assert_eq!(warnings, vec![SESSION_EXPIRED_MESSAGE.to_owned()]);
        assert_eq!(
            runtime.guard().decide(&runtime.session().session(), "/quotes/42"),
            RouteDecision::Allow,
            "unlisted pages stay public"
        );
        assert_eq!(
            runtime.guard().decide(&runtime.session().session(), "/profile"),
            RouteDecision::RedirectToLogin {
                return_to: "/profile".to_owned()
            }
        );
    }

    #[rstest]
    fn invalid_base_urls_fail_to_wire() {
        let settings = PortalSettings {
            api_base_url: Some("::".to_owned()),
            ..PortalSettings::default()
        };
        assert!(matches!(
            PortalRuntime::from_settings(&settings),
            Err(RuntimeError::InvalidBaseUrl(_))
        ));
    }
}
