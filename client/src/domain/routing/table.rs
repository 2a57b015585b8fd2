//! Path classification for the portal's pages.

use url::form_urlencoded;

use super::{
    FALLBACK_DASHBOARD_PATH, LOGIN_PATH, RETURN_TO_PARAM, RouteDecision, dashboard_path, decide,
    decide_public,
};
use crate::domain::Role;
use crate::domain::session::Session;

/// Access rule attached to a path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// Anyone, signed in or not.
    Public,
    /// Signed-out visitors only; signed-in users are sent on.
    PublicOnly,
    /// Signed-in users, optionally restricted to `roles`.
    Protected { roles: Option<Vec<Role>> },
}

impl RouteAccess {
    /// Protected page open to every role.
    pub fn signed_in() -> Self {
        Self::Protected { roles: None }
    }

    pub fn for_roles(roles: &[Role]) -> Self {
        Self::Protected {
            roles: Some(roles.to_vec()),
        }
    }

    /// Whether a signed-in user with `role` may view the page.
    pub fn admits(&self, role: Role) -> bool {
        match self {
            Self::Public => true,
            Self::PublicOnly => false,
            Self::Protected { roles } => roles.as_ref().is_none_or(|roles| roles.contains(&role)),
        }
    }
}

/// Rejected route table definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("route prefix `{0}` must start with `/`")]
    InvalidPrefix(String),
    #[error("route prefix `{0}` is declared more than once")]
    DuplicatePrefix(String),
    #[error("the sign-in page must be public-only")]
    LoginNotPublicOnly,
    #[error("dashboard `{path}` must be a protected page admitting role `{role}`")]
    DashboardRejectsRole { role: Role, path: &'static str },
}

/// Prefix table mapping paths to [`RouteAccess`].
///
/// ## Invariants
/// - the sign-in page is public-only, so an unauthenticated redirect always
///   lands on a page that renders;
/// - every role's dashboard is protected and admits that role, so a role
///   redirect always lands on a page that renders.
///
/// Unlisted paths are public.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<(String, RouteAccess)>,
}

impl RouteTable {
    /// Build and validate a table.
    pub fn new<P>(
        routes: impl IntoIterator<Item = (P, RouteAccess)>,
    ) -> Result<Self, RouteTableError>
    where
        P: Into<String>,
    {
        let mut entries: Vec<(String, RouteAccess)> = Vec::new();
        for (prefix, access) in routes {
            let prefix = normalise(&prefix.into());
            if !prefix.starts_with('/') {
                return Err(RouteTableError::InvalidPrefix(prefix));
            }
            if entries.iter().any(|(existing, _)| *existing == prefix) {
                return Err(RouteTableError::DuplicatePrefix(prefix));
            }
            entries.push((prefix, access));
        }
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        let table = Self { routes: entries };
        table.validate()?;
        Ok(table)
    }

    /// The portal's page map.
    pub fn portal() -> Result<Self, RouteTableError> {
        let mut routes = vec![
            ("/".to_owned(), RouteAccess::Public),
            (LOGIN_PATH.to_owned(), RouteAccess::PublicOnly),
            ("/register".to_owned(), RouteAccess::PublicOnly),
            ("/verify-email".to_owned(), RouteAccess::PublicOnly),
            ("/forgot-password".to_owned(), RouteAccess::PublicOnly),
            ("/reset-password".to_owned(), RouteAccess::PublicOnly),
            (FALLBACK_DASHBOARD_PATH.to_owned(), RouteAccess::signed_in()),
            ("/profile".to_owned(), RouteAccess::signed_in()),
            ("/notifications".to_owned(), RouteAccess::signed_in()),
            ("/admin".to_owned(), RouteAccess::for_roles(&[Role::Admin])),
            (
                "/finance".to_owned(),
                RouteAccess::for_roles(&[Role::Admin, Role::Finance]),
            ),
        ];
        routes.extend(
            Role::KNOWN
                .into_iter()
                .map(|role| (dashboard_path(role).to_owned(), RouteAccess::for_roles(&[role]))),
        );
        Self::new(routes)
    }

    fn validate(&self) -> Result<(), RouteTableError> {
        if self.access(LOGIN_PATH) != RouteAccess::PublicOnly {
            return Err(RouteTableError::LoginNotPublicOnly);
        }
        let roles = Role::KNOWN.into_iter().chain([Role::Unknown]);
        for role in roles {
            let path = dashboard_path(role);
            let access = self.access(path);
            let protected = matches!(access, RouteAccess::Protected { .. });
            if !protected || !access.admits(role) {
                return Err(RouteTableError::DashboardRejectsRole { role, path });
            }
        }
        Ok(())
    }

    /// Access rule for a location. Query and fragment are ignored; the
    /// longest prefix matching on a segment boundary wins.
    pub fn access(&self, location: &str) -> RouteAccess {
        let route = normalise(route_of(location));
        self.routes
            .iter()
            .find(|(prefix, _)| matches_prefix(&route, prefix))
            .map_or(RouteAccess::Public, |(_, access)| access.clone())
    }

    /// Evaluate the guard for `location` (path plus optional query).
    pub fn resolve(&self, session: &Session, location: &str) -> RouteDecision {
        match self.access(location) {
            RouteAccess::Public => RouteDecision::Allow,
            RouteAccess::Protected { roles } => decide(session, roles.as_deref(), location),
            RouteAccess::PublicOnly => {
                let return_to = return_to_param(location);
                match decide_public(session, return_to.as_deref()) {
                    RouteDecision::RedirectToDashboard(target) => {
                        RouteDecision::RedirectToDashboard(self.landing(session, target))
                    }
                    other => other,
                }
            }
        }
    }

    /// Keep a requested return target only if it will render for the user.
    fn landing(&self, session: &Session, target: String) -> String {
        let Some(role) = session.role() else {
            return target;
        };
        if self.access(&target).admits(role) {
            target
        } else {
            dashboard_path(role).to_owned()
        }
    }
}

/// Read the return-to parameter from a location's query string.
pub(crate) fn return_to_param(location: &str) -> Option<String> {
    let query = location.split('#').next()?.split_once('?')?.1;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == RETURN_TO_PARAM)
        .map(|(_, value)| value.into_owned())
}

fn route_of(location: &str) -> &str {
    location.split(['?', '#']).next().unwrap_or(location)
}

fn normalise(route: &str) -> String {
    let trimmed = route.trim().trim_end_matches('/');
    if trimmed.is_empty() && route.trim().starts_with('/') {
        "/".to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn matches_prefix(route: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    route == prefix
        || route
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}
