//! Guard decisions.

use super::{LOGIN_PATH, dashboard_path};
use crate::domain::Role;
use crate::domain::session::Session;

/// Outcome of evaluating a guard against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The session is still loading; render a neutral placeholder.
    Pending,
    /// Render the page.
    Allow,
    /// Send the visitor to sign in, remembering where they were going.
    RedirectToLogin { return_to: String },
    /// Send a signed-in user to the given landing page.
    RedirectToDashboard(String),
}

impl RouteDecision {
    pub fn is_redirect(&self) -> bool {
        matches!(
            self,
            Self::RedirectToLogin { .. } | Self::RedirectToDashboard(_)
        )
    }
}

/// Decision for a protected page.
///
/// `required_roles` of `None` admits every signed-in user. While the session
/// is loading the answer is always [`RouteDecision::Pending`], never a
/// redirect.
pub fn decide(
    session: &Session,
    required_roles: Option<&[Role]>,
    current_path: &str,
) -> RouteDecision {
    if session.is_loading() {
        return RouteDecision::Pending;
    }
    let Some(role) = session.role() else {
        return RouteDecision::RedirectToLogin {
            return_to: current_path.to_owned(),
        };
    };
    match required_roles {
        Some(roles) if !roles.contains(&role) => {
            RouteDecision::RedirectToDashboard(dashboard_path(role).to_owned())
        }
        _ => RouteDecision::Allow,
    }
}

/// Decision for a public-only page such as sign-in or registration.
///
/// A signed-in user is sent to `return_to` when it is a safe local path,
/// otherwise to their dashboard.
pub fn decide_public(session: &Session, return_to: Option<&str>) -> RouteDecision {
    if session.is_loading() {
        return RouteDecision::Pending;
    }
    let Some(role) = session.role() else {
        return RouteDecision::Allow;
    };
    let target = return_to
        .and_then(sanitize_return_to)
        .unwrap_or_else(|| dashboard_path(role).to_owned());
    RouteDecision::RedirectToDashboard(target)
}

/// Accept only local absolute paths that do not lead back to sign-in.
///
/// Rejects scheme-relative (`//host`) and backslash tricks so the return
/// target can never leave the portal.
pub fn sanitize_return_to(raw: &str) -> Option<String> {
    let candidate = raw.trim();
    let local = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.starts_with("/\\")
        && !candidate.chars().any(char::is_control);
    if !local {
        return None;
    }
    let route = candidate.split(['?', '#']).next().unwrap_or(candidate);
    let to_login = route == LOGIN_PATH || route.starts_with(&format!("{LOGIN_PATH}/"));
    (!to_login).then(|| candidate.to_owned())
}
