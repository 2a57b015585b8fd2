//! Unit tests for the layer lint.

use std::path::PathBuf;

use rstest::rstest;

use super::*;

fn lint_one(file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
    lint_sources(&[LintSource {
        file: PathBuf::from(file),
        contents: contents.to_owned(),
    }])
}

#[rstest]
#[case(
    "inbound/guards.rs",
    "use crate::domain::routing::RouteTable; fn guard() { let _ = RouteTable::portal(); }",
    true
)]
#[case(
    "inbound/guards.rs",
    "use crate::outbound::ReqwestTransport; fn guard() { let _ = 1; }",
    false
)]
#[case(
    "inbound/guards.rs",
    "use portal_client::outbound::TabTokenStore; fn guard() { let _ = 1; }",
    false
)]
#[case("inbound/guards.rs", "use reqwest::Client; fn guard() {}", false)]
#[case(
    "domain/gateway/mod.rs",
    "fn send() { let _ = reqwest::Client::new(); }",
    false
)]
#[case(
    "domain/session/manager.rs",
    "use super::super::inbound::RouteGuard; fn x() {}",
    false
)]
#[case(
    "domain/routing/table.rs",
    "use url::form_urlencoded; fn x() { let _ = 1; }",
    true
)]
#[case(
    "outbound/http/transport.rs",
    "use crate::inbound::Navigator; fn x() {}",
    false
)]
#[case(
    "outbound/http/transport.rs",
    "use crate::domain::ports::HttpTransport; use reqwest::Client; fn x() {}",
    true
)]
fn detects_boundary_violations(#[case] file: &str, #[case] contents: &str, #[case] ok: bool) {
    let result = lint_one(file, contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
fn files_outside_the_layers_are_rejected() {
    let result = lint_one("runtime.rs", "fn x() {}");
    assert!(matches!(result, Err(ArchitectureLintError::Parse { .. })));
}

#[rstest]
fn each_offending_file_reports_each_rule_once() {
    let result = lint_one(
        "domain/session/writer.rs",
        "use crate::outbound::TabTokenStore; use crate::outbound::HttpAuthApi; fn x() {}",
    );
    let Err(ArchitectureLintError::Violations(violations)) = result else {
        panic!("expected violations, got {result:?}");
    };
    assert_eq!(violations.len(), 1);
    assert_eq!(
        violations[0].message,
        "domain module must not depend on crate::outbound"
    );
}
