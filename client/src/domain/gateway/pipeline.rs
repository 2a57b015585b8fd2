//! Pure request and response stages of the gateway.
//!
//! Neither stage touches shared state: [`prepare`] returns a new request and
//! [`classify`] turns a response into a [`Verdict`] for the caller to act on.

use serde_json::Value;

use crate::domain::ports::{ApiRequest, ApiResponse};
use crate::domain::{AccessToken, Error};

/// Endpoints that never carry a bearer and never trigger a refresh.
const ANONYMOUS_ROUTES: [&str; 7] = [
    "/auth/login",
    "/auth/refresh",
    "/auth/register",
    "/auth/verify-email",
    "/auth/resend-otp",
    "/auth/forgot-password",
    "/auth/reset-password",
];

/// Endpoints that carry a bearer but must not trigger a refresh.
const NO_REFRESH_ROUTES: [&str; 1] = ["/auth/logout"];

/// How the gateway treats one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointPolicy {
    /// Credential exchange endpoints: no bearer, no refresh.
    Anonymous,
    /// Bearer attached, but a 401 is final.
    BearerOnly,
    /// Bearer attached; a 401 triggers one refresh and replay.
    Protected,
}

impl EndpointPolicy {
    /// Policy for a request path. The query string is ignored.
    pub fn for_path(path: &str) -> Self {
        let route = path.split(['?', '#']).next().unwrap_or(path);
        let route = route.trim_end_matches('/');
        if ANONYMOUS_ROUTES.contains(&route) {
            Self::Anonymous
        } else if NO_REFRESH_ROUTES.contains(&route) {
            Self::BearerOnly
        } else {
            Self::Protected
        }
    }

    pub fn attaches_bearer(self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    pub fn refreshes_on_unauthorized(self) -> bool {
        matches!(self, Self::Protected)
    }
}

/// Outcome of the incoming stage.
#[derive(Debug)]
pub enum Verdict {
    /// Hand the response to the caller.
    Deliver(ApiResponse),
    /// Fail the call with this error.
    Fail(Error),
    /// Refresh the access token and replay once. Carries the error to
    /// surface if the refresh fails.
    Refresh(Error),
}

/// Outgoing stage: attach the bearer when the endpoint allows it.
pub fn prepare(request: ApiRequest, token: Option<AccessToken>) -> ApiRequest {
    let policy = EndpointPolicy::for_path(request.path());
    match token {
        Some(token) if policy.attaches_bearer() => request.with_bearer(token),
        _ => request,
    }
}

/// Incoming stage.
///
/// A 401 asks for a refresh only on a protected endpoint whose request has
/// not been replayed yet; every other failure is final.
pub fn classify(request: &ApiRequest, response: ApiResponse) -> Verdict {
    if response.is_success() {
        return Verdict::Deliver(response);
    }
    let error = status_error(&response);
    let policy = EndpointPolicy::for_path(request.path());
    if response.status == 401 && policy.refreshes_on_unauthorized() && !request.meta().retried {
        Verdict::Refresh(error)
    } else {
        Verdict::Fail(error)
    }
}

/// Map a non-success response onto the domain error taxonomy.
///
/// The backend reports failures as `{"message": ..., "errors": ...}`; field
/// errors, when present, become the error details.
pub fn status_error(response: &ApiResponse) -> Error {
    let payload: Option<Value> = serde_json::from_slice(&response.body).ok();
    let message = payload
        .as_ref()
        .and_then(|body| body.get("message").or_else(|| body.get("error")))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_owned);
    let details = payload
        .as_ref()
        .and_then(|body| body.get("errors"))
        .filter(|errors| !errors.is_null())
        .cloned();
    let status = response.status;
    let text = |fallback: &str| message.clone().unwrap_or_else(|| fallback.to_owned());

    let error = match status {
        401 => Error::unauthorized(text("authentication required")),
        403 => Error::forbidden(text("access denied")),
        404 => Error::not_found(text("resource not found")),
        408 | 504 => Error::timeout(text("request timed out")),
        400..=499 => Error::invalid_request(text("request rejected")),
        500..=599 => Error::server(text("server error")),
        _ => Error::server(format!("unexpected status {status}")),
    };
    match details {
        Some(details) => error.with_details(details),
        None => error,
    }
}
