//! Route guards that wrap a page and turn a [`RouteDecision`] into a view.
//!
//! Pages are built lazily: the page closure only runs once the decision is
//! [`RouteDecision::Allow`], so a protected page never renders, not even
//! briefly, for a visitor who is about to be redirected.

use tokio::sync::watch;
use tracing::debug;
use url::form_urlencoded;

use crate::domain::routing::{
    LOGIN_PATH, RETURN_TO_PARAM, RouteDecision, RouteTable, decide, decide_public,
    return_to_param,
};
use crate::domain::{Error, Role, Session};

/// What the page layer should show for a guarded location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView<P> {
    /// Neutral placeholder while the session is loading.
    Loading,
    /// The guarded page.
    Page(P),
    /// Navigate elsewhere. `replace` asks for a history replacement so the
    /// back button does not return to the guarded page.
    Redirect { to: String, replace: bool },
}

impl<P> GuardView<P> {
    /// Build the view for `decision`, constructing the page only when allowed.
    pub fn from_decision(decision: RouteDecision, page: impl FnOnce() -> P) -> Self {
        match decision {
            RouteDecision::Pending => Self::Loading,
            RouteDecision::Allow => Self::Page(page()),
            RouteDecision::RedirectToLogin { return_to } => Self::Redirect {
                to: login_location(&return_to),
                replace: true,
            },
            RouteDecision::RedirectToDashboard(to) => Self::Redirect { to, replace: true },
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Carry out a redirect through `navigator` and hand back the page, if
    /// one was rendered.
    pub fn perform(self, navigator: &dyn Navigator) -> Option<P> {
        match self {
            Self::Loading => None,
            Self::Page(page) => Some(page),
            Self::Redirect { to, replace } => {
                debug!(to = to.as_str(), replace, "guard redirect");
                navigator.navigate(&to, replace);
                None
            }
        }
    }
}

/// Where the page layer sends redirects.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator {
    fn navigate(&self, to: &str, replace: bool);
}

/// Sign-in location that returns to `return_to` afterwards.
///
/// # Examples
/// ```
/// use portal_client::inbound::login_location;
///
/// assert_eq!(login_location("/quotes/42"), "/login?from=%2Fquotes%2F42");
/// ```
pub fn login_location(return_to: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(RETURN_TO_PARAM, return_to)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

/// Guard for a single protected page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedRoute {
    roles: Option<Vec<Role>>,
}

impl ProtectedRoute {
    /// Admit every signed-in user.
    pub fn signed_in() -> Self {
        Self::default()
    }

    /// Admit signed-in users holding one of `roles`.
    pub fn for_roles(roles: &[Role]) -> Self {
        Self {
            roles: Some(roles.to_vec()),
        }
    }

    pub fn decide(&self, session: &Session, location: &str) -> RouteDecision {
        decide(session, self.roles.as_deref(), location)
    }

    pub fn render<P>(
        &self,
        session: &Session,
        location: &str,
        page: impl FnOnce() -> P,
    ) -> GuardView<P> {
        GuardView::from_decision(self.decide(session, location), page)
    }
}

/// Guard for a page only signed-out visitors should see, such as sign-in.
///
/// Signed-in users are sent to the location's `from` parameter when it is a
/// safe local path, otherwise to their dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublicOnlyRoute;

impl PublicOnlyRoute {
    pub fn decide(self, session: &Session, location: &str) -> RouteDecision {
        decide_public(session, return_to_param(location).as_deref())
    }

    pub fn render<P>(
        self,
        session: &Session,
        location: &str,
        page: impl FnOnce() -> P,
    ) -> GuardView<P> {
        GuardView::from_decision(self.decide(session, location), page)
    }
}

/// Guard for every location, driven by a [`RouteTable`].
#[derive(Debug, Clone)]
pub struct RouteGuard {
    table: RouteTable,
}

impl RouteGuard {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn decide(&self, session: &Session, location: &str) -> RouteDecision {
        self.table.resolve(session, location)
    }

    pub fn render<P>(
        &self,
        session: &Session,
        location: &str,
        page: impl FnOnce() -> P,
    ) -> GuardView<P> {
        GuardView::from_decision(self.decide(session, location), page)
    }

    /// Wait for the session to stop loading, then render.
    ///
    /// # Errors
    ///
    /// Returns an internal error when the session owner has gone away before
    /// the session settled.
    pub async fn render_settled<P>(
        &self,
        sessions: &mut watch::Receiver<Session>,
        location: &str,
        page: impl FnOnce() -> P,
    ) -> Result<GuardView<P>, Error> {
        let session = sessions
            .wait_for(|session| !session.is_loading())
            .await
            .map_err(|_| Error::internal("session owner dropped while loading"))?
            .clone();
        Ok(self.render(&session, location, page))
    }
}

#[cfg(test)]
mod tests {
    //! Guard rendering and redirect encoding.

    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::test_support::{sample_user, user_with_role};

    #[fixture]
    fn guard() -> RouteGuard {
        RouteGuard::new(RouteTable::portal().expect("portal table"))
    }

    fn customer() -> Session {
        Session::signed_in(sample_user())
    }

    #[rstest]
    fn loading_renders_a_placeholder_without_building_the_page() {
        let view = ProtectedRoute::signed_in().render(&Session::bootstrapping(), "/profile", || {
            panic!("page must not be built while loading")
        });
        assert!(view.is_loading());
    }

    #[rstest]
    fn signed_out_visitors_are_redirected_with_an_encoded_return_path() {
        let view = ProtectedRoute::signed_in().render(
            &Session::signed_out(),
            "/quotes/42?tab=files",
            || "quote",
        );
        assert_eq!(
            view,
            GuardView::Redirect {
                to: "/login?from=%2Fquotes%2F42%3Ftab%3Dfiles".to_owned(),
                replace: true,
            }
        );
    }

    #[rstest]
    fn role_mismatch_redirects_to_the_role_dashboard() {
        let view = ProtectedRoute::for_roles(&[Role::Admin]).render(
            &customer(),
            "/dashboard/admin",
            || "admin",
        );
        assert_eq!(
            view,
            GuardView::Redirect {
                to: "/dashboard/customer".to_owned(),
                replace: true,
            }
        );
    }

    #[rstest]
    fn matching_role_renders_the_page() {
        let admin = Session::signed_in(user_with_role("u-9", Role::Admin));
        let view = ProtectedRoute::for_roles(&[Role::Admin]).render(&admin, "/admin", || "admin");
        assert_eq!(view, GuardView::Page("admin"));
    }

    #[rstest]
    fn public_only_guard_reads_the_return_path_back() {
        let location = login_location("/quotes/42");
        let decision = PublicOnlyRoute.decide(&customer(), &location);
        assert_eq!(
            decision,
            RouteDecision::RedirectToDashboard("/quotes/42".to_owned())
        );
        assert_eq!(
            PublicOnlyRoute.render(&Session::signed_out(), &location, || "login form"),
            GuardView::Page("login form")
        );
    }

    #[rstest]
    fn table_guard_keeps_unreachable_return_paths_out(guard: RouteGuard) {
        let view = guard.render(&customer(), &login_location("/admin/users"), || "login");
        assert_eq!(
            view,
            GuardView::Redirect {
                to: "/dashboard/customer".to_owned(),
                replace: true,
            }
        );
    }

    #[rstest]
    fn redirects_are_performed_through_the_navigator(guard: RouteGuard) {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/login?from=%2Fprofile"), eq(true))
            .times(1)
            .return_const(());

        let page = guard
            .render(&Session::signed_out(), "/profile", || "profile")
            .perform(&navigator);

        assert!(page.is_none());
    }

    #[rstest]
    fn rendered_pages_skip_the_navigator(guard: RouteGuard) {
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().never();

        let page = guard
            .render(&customer(), "/dashboard/customer", || "dashboard")
            .perform(&navigator);

        assert_eq!(page, Some("dashboard"));
    }

    #[rstest]
    #[tokio::test]
    async fn settled_render_waits_for_loading_to_finish(guard: RouteGuard) {
        let (sender, mut receiver) = watch::channel(Session::bootstrapping());
        let render = tokio::spawn({
            let guard = guard.clone();
            async move {
                guard
                    .render_settled(&mut receiver, "/profile", || "profile")
                    .await
            }
        });
        tokio::task::yield_now().await;
        sender.send_replace(customer());

        let view = render.await.expect("task").expect("settled");
        assert_eq!(view, GuardView::Page("profile"));
    }

    #[rstest]
    #[tokio::test]
    async fn settled_render_fails_when_the_session_owner_is_gone(guard: RouteGuard) {
        let (sender, mut receiver) = watch::channel(Session::bootstrapping());
        drop(sender);

        let error = guard
            .render_settled(&mut receiver, "/profile", || "profile")
            .await
            .expect_err("no session owner");
        assert_eq!(error.code(), crate::domain::ErrorCode::InternalError);
    }
}
