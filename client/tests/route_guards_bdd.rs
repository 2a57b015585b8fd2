//! Behaviour tests for route guards over the portal route table.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use portal_client::domain::routing::RouteTable;
use portal_client::domain::{Role, Session};
use portal_client::inbound::{GuardView, RouteGuard};
use portal_client::test_support::user_with_role;

struct GuardWorld {
    guard: RouteGuard,
    session: RefCell<Session>,
    view: RefCell<Option<GuardView<String>>>,
}

impl GuardWorld {
    fn new() -> Self {
        Self {
            guard: RouteGuard::new(RouteTable::portal().expect("portal route table")),
            session: RefCell::new(Session::bootstrapping()),
            view: RefCell::new(None),
        }
    }

    fn with_view<F>(&self, f: F)
    where
        F: FnOnce(&GuardView<String>),
    {
        let view = self.view.borrow();
        f(view.as_ref().expect("a location was opened"));
    }
}

fn parse_role(raw: &str) -> Role {
    serde_json::from_value(Value::String(raw.to_owned())).expect("role name")
}

#[fixture]
fn world() -> GuardWorld {
    GuardWorld::new()
}

#[given("a session that is still loading")]
fn a_session_that_is_still_loading(world: &GuardWorld) {
    *world.session.borrow_mut() = Session::bootstrapping();
}

#[given("a signed-out visitor")]
fn a_signed_out_visitor(world: &GuardWorld) {
    *world.session.borrow_mut() = Session::signed_out();
}

#[given("a signed-in {role} user")]
fn a_signed_in_user(world: &GuardWorld, role: String) {
    let user = user_with_role("u-1", parse_role(&role));
    *world.session.borrow_mut() = Session::signed_in(user);
}

#[when("the visitor opens {location}")]
fn the_visitor_opens(world: &GuardWorld, location: String) {
    let session = world.session.borrow();
    let view = world
        .guard
        .render(&session, &location, || format!("page {location}"));
    *world.view.borrow_mut() = Some(view);
}

#[then("a loading placeholder is shown")]
fn a_loading_placeholder_is_shown(world: &GuardWorld) {
    world.with_view(|view| assert!(view.is_loading(), "got {view:?}"));
}

#[then("the page is rendered")]
fn the_page_is_rendered(world: &GuardWorld) {
    world.with_view(|view| {
        assert!(matches!(view, GuardView::Page(page) if page.starts_with("page /")));
    });
}

#[then("the visitor is redirected to {target}")]
fn the_visitor_is_redirected_to(world: &GuardWorld, target: String) {
    world.with_view(|view| match view {
        GuardView::Redirect { to, replace } => {
            assert_eq!(to, &target);
            assert!(*replace, "guard redirects replace the history entry");
        }
        other => panic!("expected a redirect, got {other:?}"),
    });
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "A session that is still loading never redirects"
)]
fn a_session_that_is_still_loading_never_redirects(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Signed-out visitors are sent to sign in with their destination"
)]
fn signed_out_visitors_are_sent_to_sign_in(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Public pages render for everyone"
)]
fn public_pages_render_for_everyone(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Staff are sent to their own dashboard"
)]
fn staff_are_sent_to_their_own_dashboard(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "A matching role renders the page"
)]
fn a_matching_role_renders_the_page(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Signed-in users leave the login page for their return path"
)]
fn signed_in_users_leave_the_login_page(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "A return path the role cannot open falls back to its dashboard"
)]
fn a_forbidden_return_path_falls_back_to_the_dashboard(world: GuardWorld) {
    drop(world);
}
